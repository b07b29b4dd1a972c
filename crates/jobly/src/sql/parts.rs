/// A piece of SQL text: literal text or a placeholder to be numbered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SqlPart {
    Raw(String),
    Param,
}
