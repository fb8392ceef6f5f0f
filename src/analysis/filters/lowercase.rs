use crate::analysis::filter::TermFilter;

pub struct LowercaseFilter;

impl TermFilter for LowercaseFilter {
    fn apply(&self, term: String) -> Option<String> {
        if term.chars().any(char::is_uppercase) {
            Some(term.to_lowercase())
        } else {
            Some(term)
        }
    }

    fn name(&self) -> &str {
        "lowercase"
    }
}
