/// A (release, component, architecture) whose index needs rebuilding.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DirtySlot {
    pub release: String,
    pub component: String,
    pub architecture: String,
}
