//! Definitions Registry merge.
//!
//! Entries are keyed: classes and functions by `(location, name)`, files by
//! `path`. A known key is replaced in place, an unknown key is
//! appended, so no recorded key is ever dropped by a later merge.

use crate::core::types::{ClassDef, Definitions, FileDef, FunctionDef, MergeSummary};

/// Merge `incoming` into `current` and report what changed.
pub fn merge_definitions(current: &mut Definitions, incoming: Definitions) -> MergeSummary {
    let mut summary = MergeSummary::default();

    for class in incoming.classes {
        record(&mut summary, upsert(&mut current.classes, class, class_key));
    }
    for function in incoming.functions {
        record(&mut summary, upsert(&mut current.functions, function, function_key));
    }
    for file in incoming.files {
        record(&mut summary, upsert(&mut current.files, file, file_key));
    }

    summary.total_classes = current.classes.len();
    summary.total_functions = current.functions.len();
    summary.total_files = current.files.len();
    summary
}

/// True if every key recorded in `before` is still present in `after`.
pub fn retains_keys(before: &Definitions, after: &Definitions) -> bool {
    before
        .classes
        .iter()
        .all(|c| after.classes.iter().any(|o| class_key(o) == class_key(c)))
        && before
            .functions
            .iter()
            .all(|f| after.functions.iter().any(|o| function_key(o) == function_key(f)))
        && before
            .files
            .iter()
            .all(|f| after.files.iter().any(|o| file_key(o) == file_key(f)))
}

enum Upsert {
    Added,
    Updated,
}

fn record(summary: &mut MergeSummary, outcome: Upsert) {
    match outcome {
        Upsert::Added => summary.added += 1,
        Upsert::Updated => summary.updated += 1,
    }
}

fn upsert<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) -> Upsert {
    let wanted = key(&item);
    match items.iter().position(|existing| key(existing) == wanted) {
        Some(idx) => {
            items[idx] = item;
            Upsert::Updated
        }
        None => {
            items.push(item);
            Upsert::Added
        }
    }
}

fn class_key(class: &ClassDef) -> (String, String) {
    (normalize_location(&class.location), class.name.trim().to_string())
}

fn function_key(function: &FunctionDef) -> (String, String) {
    (normalize_location(&function.location), function.name.trim().to_string())
}

fn file_key(file: &FileDef) -> String {
    normalize_location(&file.path)
}

fn normalize_location(path: &str) -> String {
    path.trim().trim_start_matches("./").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(location: &str, name: &str, doc: &str) -> ClassDef {
        ClassDef {
            location: location.to_string(),
            name: name.to_string(),
            init_args: Vec::new(),
            methods: Vec::new(),
            docstring: doc.to_string(),
        }
    }

    fn function(location: &str, name: &str) -> FunctionDef {
        FunctionDef {
            location: location.to_string(),
            name: name.to_string(),
            args: Vec::new(),
            docstring: String::new(),
        }
    }

    fn file(path: &str, description: &str) -> FileDef {
        FileDef {
            path: path.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn merge_appends_new_entries_and_keeps_old_ones() {
        let mut registry = Definitions {
            classes: vec![class("a.py", "A", "first")],
            functions: vec![function("a.py", "helper")],
            files: vec![file("a.py", "module a")],
        };
        let before = registry.clone();

        let summary = merge_definitions(
            &mut registry,
            Definitions {
                classes: vec![class("b.py", "B", "")],
                functions: vec![function("b.py", "run")],
                files: vec![file("b.py", "module b")],
            },
        );

        assert_eq!(summary.added, 3);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.total_classes, 2);
        assert_eq!(summary.total_functions, 2);
        assert_eq!(summary.total_files, 2);
        assert!(retains_keys(&before, &registry));
    }

    #[test]
    fn merge_replaces_matching_keys_in_place() {
        let mut registry = Definitions {
            classes: vec![class("a.py", "A", "old"), class("c.py", "C", "")],
            functions: Vec::new(),
            files: vec![file("a.py", "old")],
        };

        let summary = merge_definitions(
            &mut registry,
            Definitions {
                classes: vec![class("a.py", "A", "new")],
                functions: Vec::new(),
                files: vec![file("./a.py", "new")],
            },
        );

        assert_eq!(summary.added, 0);
        assert_eq!(summary.updated, 2);
        assert_eq!(registry.classes[0].docstring, "new");
        assert_eq!(registry.classes[1].name, "C");
        assert_eq!(registry.files.len(), 1);
        assert_eq!(registry.files[0].description, "new");
    }

    #[test]
    fn same_name_in_another_location_is_a_new_class() {
        let mut registry = Definitions {
            classes: vec![class("a.py", "Config", "")],
            ..Definitions::default()
        };
        merge_definitions(
            &mut registry,
            Definitions {
                classes: vec![class("b.py", "Config", "")],
                ..Definitions::default()
            },
        );
        assert_eq!(registry.classes.len(), 2);
    }

    #[test]
    fn same_function_name_in_two_files_keeps_both() {
        let mut registry = Definitions {
            functions: vec![function("calc.py", "main")],
            ..Definitions::default()
        };
        let before = registry.clone();

        let summary = merge_definitions(
            &mut registry,
            Definitions {
                functions: vec![function("cli.py", "main"), function("./calc.py", "main")],
                ..Definitions::default()
            },
        );

        assert_eq!(summary.added, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(registry.functions.len(), 2);
        assert!(retains_keys(&before, &registry));
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let incoming = Definitions {
            classes: vec![class("a.py", "A", "")],
            functions: vec![function("a.py", "f")],
            files: vec![file("a.py", "")],
        };
        let mut once = Definitions::default();
        merge_definitions(&mut once, incoming.clone());
        let mut twice = once.clone();
        let summary = merge_definitions(&mut twice, incoming);

        assert_eq!(once, twice);
        assert_eq!(summary.added, 0);
        assert_eq!(summary.updated, 3);
    }
}
