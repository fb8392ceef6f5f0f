/// One stage of the term pipeline: rewrites a term or drops it
pub trait TermFilter: Send + Sync {
    fn apply(&self, term: String) -> Option<String>;

    fn name(&self) -> &str;
}
