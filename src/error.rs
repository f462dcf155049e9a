use thiserror::Error;

/// Query-time failures. Both variants carry the offending key so the HTTP
/// layer can report a user-readable message instead of a bare status code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error("unknown item `{0}`: not a key of the item similarity matrix")]
    UnknownItem(String),
    #[error("unknown user `{0}`: not a key of the user similarity matrix")]
    UnknownUser(String),
}

/// Artifact load and validation failures. These are only raised while a
/// snapshot is being built, never while one is being queried.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("similarity matrix is not square: {qty_keys} keys but {qty_scores} scores")]
    NotSquare { qty_keys: usize, qty_scores: usize },
    #[error("rating pivot shape mismatch: {qty_items} items x {qty_users} users but {qty_scores} scores")]
    ShapeMismatch {
        qty_items: usize,
        qty_users: usize,
        qty_scores: usize,
    },
    #[error("duplicate key `{key}`")]
    DuplicateKey { key: String },
    #[error("similarity matrix is not symmetric between `{a}` and `{b}`")]
    Asymmetric { a: String, b: String },
    #[error("self-similarity of `{key}` is not the maximum of its row")]
    DiagonalNotMaximal { key: String },
    #[error("rating pivot user `{user}` is missing from the user similarity matrix")]
    UserNotCovered { user: String },
    #[error("rating pivot item `{item}` is missing from the item similarity matrix")]
    ItemNotCovered { item: String },
}
