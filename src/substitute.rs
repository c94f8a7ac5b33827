use crate::{
    error::SubstitutionError,
    excel::worksheet::{Cell, CellValue, FormulaRole},
    rules::Ruleset,
};
use std::mem;
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub find: String,
    pub replace: String,
    pub before: String,
}
#[derive(Debug)]
pub enum CellOutcome {
    Skipped,
    Unchanged,
    Replaced {
        text: String,
        substitutions: Vec<Substitution>,
    },
    Failed(SubstitutionError),
}
/// Applies every rule in order, each to the output of the previous one.
pub fn apply_rules(text: &str, ruleset: &Ruleset) -> (String, Vec<Substitution>) {
    let mut working = text.to_owned();
    let mut substitutions = Vec::new();
    for rule in ruleset {
        if !working.contains(rule.find.as_str()) {
            continue;
        }
        let replaced = working.replace(rule.find.as_str(), &rule.replace);
        substitutions.push(Substitution {
            find: rule.find.clone(),
            replace: rule.replace.clone(),
            before: mem::replace(&mut working, replaced),
        });
    }
    (working, substitutions)
}
pub fn substitute_cell(
    cell: Option<&Cell>,
    shared_strings: &[String],
    ruleset: &Ruleset,
) -> CellOutcome {
    let Some(cell) = cell else {
        return CellOutcome::Skipped;
    };
    let text = match cell.value(shared_strings) {
        Ok(CellValue::Text(text)) => text,
        Ok(CellValue::Empty) => return CellOutcome::Skipped,
        Err(e) => return CellOutcome::Failed(e),
    };
    let (replaced, substitutions) = apply_rules(&text, ruleset);
    if replaced == text {
        return CellOutcome::Unchanged;
    }
    if cell.formula_role() == Some(FormulaRole::SharedAnchor) {
        return CellOutcome::Failed(SubstitutionError::SharedFormulaAnchor);
    }
    CellOutcome::Replaced {
        text: replaced,
        substitutions,
    }
}
