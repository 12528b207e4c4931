pub mod config;
pub mod document;
pub mod factory;
pub mod followup;
pub mod form;
pub mod id;
pub mod inspection;
pub mod lenient;
pub mod record;
pub mod search;
pub mod user;
pub mod validate;
pub mod view;

pub use config::{ConfigError, DashboardConfig, Endpoint, PageSize};
pub use document::Document;
pub use factory::Factory;
pub use followup::{Followup, FollowupDetail, FollowupDraft, FollowupResult};
pub use form::{FollowupForm, FormError, InspectionForm, Section, Toggle, set_json_field};
pub use id::RecordId;
pub use inspection::{Fine, FineDetail, Inspection, Penalty, PenaltyDetail};
pub use record::{EntityKind, FieldMap, Record, Stored};
pub use search::search;
pub use user::{Role, User};
pub use validate::ValidationError;
pub use view::{DetailSection, DetailView, Status, TableRow, TableView, Tabular};
