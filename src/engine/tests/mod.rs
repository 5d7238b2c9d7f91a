mod common;

mod checklist_eval;
mod criteria_eval;
mod specialty_validation;
