//! Plan invariants not expressible via JSON Schema, and execution ordering.

use std::collections::HashSet;

use crate::core::path::normalize_relative;
use crate::core::types::{PlanDocument, Step};

/// Check semantic invariants of a Plan Document:
/// - at least one step
/// - step numbers are >= 1 and unique
/// - every `save_path` is a safe workspace-relative path outside the
///   `reserved` top-level names (log directory, control files)
/// - `modification` is not blank for file steps
pub fn validate_plan(plan: &PlanDocument, reserved: &[String]) -> Vec<String> {
    let mut errors = Vec::new();
    if plan.plan.is_empty() {
        errors.push("plan has no steps".to_string());
    }

    let mut seen = HashSet::new();
    for step in &plan.plan {
        if step.step == 0 {
            errors.push("step numbers start at 1 (found 0)".to_string());
        }
        if !seen.insert(step.step) {
            errors.push(format!("duplicate step number {}", step.step));
        }
        match normalize_relative(&step.save_path) {
            Ok(path) => {
                let top = path
                    .components()
                    .next()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .unwrap_or_default();
                if reserved.iter().any(|name| *name == top) {
                    errors.push(format!(
                        "step {}: save_path '{}' overwrites reserved '{top}'",
                        step.step, step.save_path
                    ));
                }
            }
            Err(reason) => {
                errors.push(format!("step {}: invalid save_path: {reason}", step.step));
            }
        }
        if !step.creates_directory() && step.modification.trim().is_empty() {
            errors.push(format!("step {}: modification is empty", step.step));
        }
    }
    errors
}

/// Steps in strictly ascending `step` order, whatever their order in the document.
pub fn ordered_steps(plan: &PlanDocument) -> Vec<&Step> {
    let mut steps: Vec<&Step> = plan.plan.iter().collect();
    steps.sort_by_key(|step| step.step);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ExtraInfo, StepKind};

    fn step(n: u32, save_path: &str) -> Step {
        Step {
            step: n,
            dependencies: Vec::new(),
            modification: format!("change {n}"),
            save_path: save_path.to_string(),
            extra_info: ExtraInfo::default(),
        }
    }

    #[test]
    fn ordered_steps_sorts_non_contiguous_numbers() {
        let plan = PlanDocument {
            plan: vec![step(7, "c.py"), step(2, "a.py"), step(4, "b.py")],
        };
        let order: Vec<u32> = ordered_steps(&plan).iter().map(|s| s.step).collect();
        assert_eq!(order, vec![2, 4, 7]);
    }

    #[test]
    fn validate_plan_reports_errors() {
        let mut blank = step(3, "ok.py");
        blank.modification = "  ".to_string();
        let plan = PlanDocument {
            plan: vec![step(1, "a.py"), step(1, "../b.py"), step(0, "c.py"), blank],
        };

        let errors = validate_plan(&plan, &[]);
        assert!(errors.iter().any(|err| err.contains("duplicate step number 1")));
        assert!(errors.iter().any(|err| err.contains("escapes the workspace")));
        assert!(errors.iter().any(|err| err.contains("start at 1")));
        assert!(errors.iter().any(|err| err.contains("step 3: modification is empty")));
    }

    #[test]
    fn directory_steps_may_omit_modification() {
        let mut dir = step(1, "pkg");
        dir.modification.clear();
        dir.extra_info.kind = Some(StepKind::Directory);
        let plan = PlanDocument { plan: vec![dir] };
        assert!(validate_plan(&plan, &[]).is_empty());
    }

    #[test]
    fn reserved_targets_are_rejected() {
        let reserved = vec!["ca_logs".to_string(), ".caignore".to_string()];
        let plan = PlanDocument {
            plan: vec![
                step(1, "ca_logs/plan.json"),
                step(2, "./.caignore"),
                step(3, "src/ca_logs.py"),
            ],
        };

        let errors = validate_plan(&plan, &reserved);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("step 1") && errors[0].contains("reserved 'ca_logs'"));
        assert!(errors[1].contains("step 2") && errors[1].contains("reserved '.caignore'"));
    }

    #[test]
    fn empty_plan_is_invalid() {
        let errors = validate_plan(&PlanDocument { plan: Vec::new() }, &[]);
        assert_eq!(errors, vec!["plan has no steps".to_string()]);
    }
}
