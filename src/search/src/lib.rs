mod relationship;
pub use relationship::{Relationship, RelationshipKind, RelationshipSearchEngine};

mod engine;
pub use engine::{
    AdvancedSearchCriteria, SearchEngine, SearchField, SearchResult, SearchType,
    DEFAULT_FUZZY_THRESHOLD,
};

mod api;
pub use api::{ApiError, ApiResponse, GenealogySearchAPI, PersonHit, RelationshipReport, Statistics};

mod error;
pub use error::SearchError;
