//! The dashboard session: collections, form state and command dispatch.

use std::path::{Path, PathBuf};

use inspectdesk_core::view::table;
use inspectdesk_core::{
    DashboardConfig, DetailView, Document, EntityKind, Factory, Followup, FollowupForm,
    Inspection, InspectionForm, PageSize, Record, RecordId, Stored, TableView, Tabular, User,
    search, set_json_field,
};
use inspectdesk_store::exchange;
use inspectdesk_store::link::{self, Preview};
use inspectdesk_store::RecordStore;
use inspectdesk_sync::{ListSource, SyncError, decode_list};
use tracing::{info, warn};

use crate::command::{Command, Tab};
use crate::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// A message for the user, shown once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// The body of the open form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormBody {
    Document(Document),
    Factory(Factory),
    User(User),
    Inspection(InspectionForm),
    Followup(FollowupForm),
}

impl FormBody {
    fn blank(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Document => Self::Document(Document::default()),
            EntityKind::Factory => Self::Factory(Factory::default()),
            EntityKind::User => Self::User(User::default()),
            EntityKind::Inspection => Self::Inspection(InspectionForm::new()),
            EntityKind::Followup => Self::Followup(FollowupForm::new()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Document(_) => EntityKind::Document,
            Self::Factory(_) => EntityKind::Factory,
            Self::User(_) => EntityKind::User,
            Self::Inspection(_) => EntityKind::Inspection,
            Self::Followup(_) => EntityKind::Followup,
        }
    }
}

/// A create or edit form. `editing` is set for edits.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenForm {
    pub editing: Option<RecordId>,
    pub body: FormBody,
}

/// What a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `preview` is set when a follow-up is opened for editing.
    FormOpened {
        kind: EntityKind,
        editing: Option<RecordId>,
        preview: Option<Preview>,
    },
    FormChanged,
    Preview(Preview),
    Created(EntityKind, RecordId),
    Updated(EntityKind, RecordId),
    Deleted(EntityKind, RecordId),
    Cancelled,
    Table(TableView),
    Detail(DetailView),
    Exported(Vec<PathBuf>),
    Imported(usize),
    /// The command failed; the message was also pushed as a notice.
    Rejected(String),
}

/// Per-collection result of [`Session::load_remote`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<(EntityKind, usize)>,
    pub failed: Vec<(EntityKind, String)>,
}

/// One dashboard session. Created at start-up, owns all state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: DashboardConfig,
    documents: RecordStore<Document>,
    factories: RecordStore<Factory>,
    users: RecordStore<User>,
    inspections: RecordStore<Inspection>,
    followups: RecordStore<Followup>,
    form: Option<OpenForm>,
    tab: Tab,
    page_size: PageSize,
    notices: Vec<Notice>,
}

impl Session {
    pub fn new(config: DashboardConfig) -> Self {
        let page_size = config.page_size;
        Self {
            config,
            page_size,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn documents(&self) -> &RecordStore<Document> {
        &self.documents
    }

    pub fn factories(&self) -> &RecordStore<Factory> {
        &self.factories
    }

    pub fn users(&self) -> &RecordStore<User> {
        &self.users
    }

    pub fn inspections(&self) -> &RecordStore<Inspection> {
        &self.inspections
    }

    pub fn followups(&self) -> &RecordStore<Followup> {
        &self.followups
    }

    pub fn form(&self) -> Option<&OpenForm> {
        self.form.as_ref()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Document => self.documents.len(),
            EntityKind::Factory => self.factories.len(),
            EntityKind::User => self.users.len(),
            EntityKind::Inspection => self.inspections.len(),
            EntityKind::Followup => self.followups.len(),
        }
    }

    /// Notices pushed since the last call, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: Level, message: impl Into<String>) {
        self.notices.push(Notice::new(level, message));
    }

    // ── Remote lists ──

    /// Fetch the document, factory and user lists.
    ///
    /// A failed list is reported once and leaves that collection as it was.
    pub async fn load_remote(&mut self, source: &dyn ListSource) -> LoadReport {
        let mut report = LoadReport::default();

        let documents = fetch::<Document>(source, &self.config.documents).await;
        self.settle(&mut report, EntityKind::Document, documents, |s, r| {
            s.documents.replace_all(r)
        });
        let factories = fetch::<Factory>(source, &self.config.factories).await;
        self.settle(&mut report, EntityKind::Factory, factories, |s, r| {
            s.factories.replace_all(r)
        });
        let users = fetch::<User>(source, &self.config.users).await;
        self.settle(&mut report, EntityKind::User, users, |s, r| {
            s.users.replace_all(r)
        });

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "remote load finished"
        );
        report
    }

    fn settle<T>(
        &mut self,
        report: &mut LoadReport,
        kind: EntityKind,
        fetched: Result<Vec<Stored<T>>, SyncError>,
        apply: impl FnOnce(&mut Self, Vec<Stored<T>>),
    ) {
        match fetched {
            Ok(records) => {
                report.loaded.push((kind, records.len()));
                apply(self, records);
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "failed to load list");
                self.notify(Level::Error, format!("Failed to load {kind} list: {e}"));
                report.failed.push((kind, e.to_string()));
            }
        }
    }

    // ── Dispatch ──

    /// Run one command. Failures come back as [`Outcome::Rejected`] and an
    /// error notice.
    pub fn dispatch(&mut self, command: Command) -> Outcome {
        let name = command.name();
        match self.run(command) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(command = name, error = %e, "command rejected");
                let message = e.to_string();
                self.notify(Level::Error, message.clone());
                Outcome::Rejected(message)
            }
        }
    }

    fn run(&mut self, command: Command) -> Result<Outcome, SessionError> {
        match command {
            Command::OpenCreateForm(kind) => {
                self.form = Some(OpenForm {
                    editing: None,
                    body: FormBody::blank(kind),
                });
                self.notify(Level::Info, format!("New {kind}"));
                Ok(Outcome::FormOpened {
                    kind,
                    editing: None,
                    preview: None,
                })
            }
            Command::OpenEditForm(kind, id) => self.open_edit(kind, id),
            Command::SetField { name, value } => {
                match &mut self.open_form()?.body {
                    FormBody::Document(d) => set_json_field(d, &name, &value)?,
                    FormBody::Factory(f) => set_json_field(f, &name, &value)?,
                    FormBody::User(u) => set_json_field(u, &name, &value)?,
                    FormBody::Inspection(form) => form.set_field(&name, &value)?,
                    FormBody::Followup(form) => form.set_field(&name, &value)?,
                }
                self.notify(Level::Info, format!("{name} set"));
                Ok(Outcome::FormChanged)
            }
            Command::TogglePenalty(on) => {
                self.inspection_form("toggle-penalty")?.penalty.set(on);
                self.notify(Level::Info, format!("Penalty {}", on_off(on)));
                Ok(Outcome::FormChanged)
            }
            Command::ToggleFine(on) => {
                self.inspection_form("toggle-fine")?.fine.set(on);
                self.notify(Level::Info, format!("Fine {}", on_off(on)));
                Ok(Outcome::FormChanged)
            }
            Command::ToggleFollowupResult { implemented } => {
                self.followup_form("toggle-followup-result")?
                    .set_penalty_implemented(implemented);
                let label = if implemented {
                    "implemented"
                } else {
                    "not implemented"
                };
                self.notify(Level::Info, format!("Penalty {label}"));
                Ok(Outcome::FormChanged)
            }
            Command::SelectFactory(id) => {
                let factory = self
                    .factories
                    .find_by_id(&id)
                    .map(|s| s.record.clone())
                    .ok_or(SessionError::NotFound {
                        kind: EntityKind::Factory,
                        id,
                    })?;
                self.inspection_form("select-factory")?
                    .apply_factory(&factory);
                self.notify(Level::Info, format!("Factory {} selected", factory.factoryname));
                Ok(Outcome::FormChanged)
            }
            Command::SelectOriginalInspection(id) => {
                let form = self.followup_form("select-original-inspection")?;
                let requested = id.as_ref().map(RecordId::as_str).unwrap_or_default();
                let selected = form.select_original(requested).cloned();
                let preview = link::preview(&self.inspections, selected.as_ref());
                self.announce(&preview);
                Ok(Outcome::Preview(preview))
            }
            Command::SubmitForm => self.submit(),
            Command::CancelForm => {
                self.form = None;
                self.notify(Level::Info, "Form closed");
                Ok(Outcome::Cancelled)
            }
            Command::ConfirmDelete(kind, id) => {
                match kind {
                    EntityKind::Document => {
                        self.documents.delete(&id)?;
                    }
                    EntityKind::Factory => {
                        self.factories.delete(&id)?;
                    }
                    EntityKind::User => {
                        self.users.delete(&id)?;
                    }
                    EntityKind::Inspection => {
                        self.inspections.delete(&id)?;
                    }
                    EntityKind::Followup => {
                        self.followups.delete(&id)?;
                    }
                }
                info!(kind = %kind, id = %id, "deleted");
                self.notify(Level::Success, format!("{} deleted successfully", title(kind)));
                Ok(Outcome::Deleted(kind, id))
            }
            Command::View(kind, id) => {
                let detail = match kind {
                    EntityKind::Document => detail(&self.documents, &id),
                    EntityKind::Factory => detail(&self.factories, &id),
                    EntityKind::User => detail(&self.users, &id),
                    EntityKind::Inspection => detail(&self.inspections, &id),
                    EntityKind::Followup => detail(&self.followups, &id),
                }?;
                self.notify(Level::Info, detail.title.clone());
                Ok(Outcome::Detail(detail))
            }
            Command::Search { kind, query } => {
                let view = self.table(kind, &query);
                self.notify(
                    Level::Info,
                    format!("{} of {} {kind} records match", view.total, self.len(kind)),
                );
                Ok(Outcome::Table(view))
            }
            Command::List(kind) => {
                let view = self.table(kind, "");
                self.notify(Level::Info, format!("{} {kind} records", view.total));
                Ok(Outcome::Table(view))
            }
            Command::Export { kind, dir } => {
                let kinds = match kind {
                    Some(kind) => vec![kind],
                    None => EntityKind::ALL.to_vec(),
                };
                let paths = kinds
                    .into_iter()
                    .map(|kind| self.export(kind, &dir))
                    .collect::<Result<Vec<_>, _>>()?;
                self.notify(Level::Success, "Excel file downloaded successfully");
                Ok(Outcome::Exported(paths))
            }
            Command::DownloadTemplate(dir) => {
                let path = exchange::write_factory_template(&dir)?;
                self.notify(Level::Success, "Template downloaded successfully");
                Ok(Outcome::Exported(vec![path]))
            }
            Command::ImportFactories(path) => {
                let factories = exchange::import_factories_file(&path)?;
                Ok(Outcome::Imported(self.append_factories(factories)))
            }
            Command::SwitchTab(tab) => {
                self.tab = tab;
                let view = self.table(tab.kind(), "");
                self.notify(Level::Info, format!("Showing {tab} tab"));
                Ok(Outcome::Table(view))
            }
            Command::SetPageSize(page_size) => {
                self.page_size = page_size;
                let view = self.table(EntityKind::Document, "");
                self.notify(Level::Info, format!("Showing {page_size} rows"));
                Ok(Outcome::Table(view))
            }
        }
    }

    /// Append factories parsed from an uploaded sheet.
    pub fn import_factory_bytes(&mut self, bytes: &[u8]) -> Result<usize, SessionError> {
        let factories = exchange::import_factories(bytes)?;
        Ok(self.append_factories(factories))
    }

    fn append_factories(&mut self, factories: Vec<Factory>) -> usize {
        let count = self.factories.append_many(factories).len();
        self.notify(
            Level::Success,
            format!("Successfully imported {count} factories"),
        );
        count
    }

    /// Inspections that can be picked as a follow-up original.
    pub fn penalty_candidates(&self) -> Vec<(RecordId, String)> {
        link::penalty_candidates(&self.inspections)
    }

    /// Current list for `kind`, narrowed by `query`.
    pub fn table(&self, kind: EntityKind, query: &str) -> TableView {
        match kind {
            EntityKind::Document => project(&self.documents, query, self.page_size),
            EntityKind::Factory => project(&self.factories, query, PageSize::All),
            EntityKind::User => project(&self.users, query, PageSize::All),
            EntityKind::Inspection => project(&self.inspections, query, PageSize::All),
            EntityKind::Followup => project(&self.followups, query, PageSize::All),
        }
    }

    fn export(&self, kind: EntityKind, dir: &Path) -> Result<PathBuf, SessionError> {
        let path = match kind {
            EntityKind::Document => exchange::export(self.documents.list(), dir),
            EntityKind::Factory => exchange::export(self.factories.list(), dir),
            EntityKind::User => exchange::export(self.users.list(), dir),
            EntityKind::Inspection => exchange::export(self.inspections.list(), dir),
            EntityKind::Followup => exchange::export(self.followups.list(), dir),
        }?;
        Ok(path)
    }

    // ── Forms ──

    fn open_form(&mut self) -> Result<&mut OpenForm, SessionError> {
        self.form.as_mut().ok_or(SessionError::NoOpenForm)
    }

    fn inspection_form(&mut self, command: &'static str) -> Result<&mut InspectionForm, SessionError> {
        match &mut self.open_form()?.body {
            FormBody::Inspection(form) => Ok(form),
            other => Err(SessionError::WrongForm {
                command,
                kind: other.kind(),
            }),
        }
    }

    fn followup_form(&mut self, command: &'static str) -> Result<&mut FollowupForm, SessionError> {
        match &mut self.open_form()?.body {
            FormBody::Followup(form) => Ok(form),
            other => Err(SessionError::WrongForm {
                command,
                kind: other.kind(),
            }),
        }
    }

    fn open_edit(&mut self, kind: EntityKind, id: RecordId) -> Result<Outcome, SessionError> {
        let missing = || SessionError::NotFound {
            kind,
            id: id.clone(),
        };
        let body = match kind {
            EntityKind::Document => {
                FormBody::Document(self.documents.find_by_id(&id).ok_or_else(missing)?.record.clone())
            }
            EntityKind::Factory => {
                FormBody::Factory(self.factories.find_by_id(&id).ok_or_else(missing)?.record.clone())
            }
            EntityKind::User => {
                let mut user = self.users.find_by_id(&id).ok_or_else(missing)?.record.clone();
                user.password.clear();
                FormBody::User(user)
            }
            EntityKind::Inspection => FormBody::Inspection(InspectionForm::from_record(
                &self.inspections.find_by_id(&id).ok_or_else(missing)?.record,
            )),
            EntityKind::Followup => FormBody::Followup(FollowupForm::from_record(
                &self.followups.find_by_id(&id).ok_or_else(missing)?.record,
            )),
        };
        // The original may have changed or gone since the follow-up was made.
        let preview = match &body {
            FormBody::Followup(form) => Some(link::preview(
                &self.inspections,
                form.original_inspection.as_ref(),
            )),
            _ => None,
        };
        self.form = Some(OpenForm {
            editing: Some(id.clone()),
            body,
        });
        self.notify(Level::Info, format!("Editing {kind} {id}"));
        if let Some(preview) = &preview {
            self.announce(preview);
        }
        Ok(Outcome::FormOpened {
            kind,
            editing: Some(id),
            preview,
        })
    }

    fn announce(&mut self, preview: &Preview) {
        match preview {
            Preview::Loaded {
                has_penalty: false, ..
            } => self.notify(
                Level::Info,
                "This original inspection carries no penalty to follow up on",
            ),
            Preview::Missing(id) => self.notify(Level::Info, format!("Inspection {id} not found")),
            Preview::Loaded { .. } => self.notify(Level::Info, "Original inspection loaded"),
            Preview::Cleared => self.notify(Level::Info, "Original inspection cleared"),
        }
    }

    /// Validate and write the open form. On failure the form stays open
    /// and nothing is written.
    fn submit(&mut self) -> Result<Outcome, SessionError> {
        let OpenForm { editing, body } = self.form.clone().ok_or(SessionError::NoOpenForm)?;
        let kind = body.kind();
        let is_edit = editing.is_some();
        let id = match body {
            FormBody::Document(d) => save(&mut self.documents, editing, d)?,
            FormBody::Factory(f) => save(&mut self.factories, editing, f)?,
            FormBody::User(u) => save(&mut self.users, editing, u)?,
            FormBody::Inspection(form) => save(&mut self.inspections, editing, form.submit()?)?,
            FormBody::Followup(form) => {
                let draft = form.submit()?;
                match editing {
                    Some(id) => {
                        let existing = self.followups.find_by_id(&id).ok_or_else(|| {
                            SessionError::NotFound {
                                kind,
                                id: id.clone(),
                            }
                        })?;
                        // The link and snapshot stay as they were at creation.
                        let record = draft.attach(existing.record.original_inspection_data.clone());
                        self.followups.replace(&id, &record)?;
                        id
                    }
                    None => link::create_followup(&mut self.followups, &self.inspections, draft)?,
                }
            }
        };
        self.form = None;
        let outcome = if is_edit {
            self.notify(Level::Success, format!("{} updated successfully", title(kind)));
            Outcome::Updated(kind, id)
        } else {
            self.notify(Level::Success, format!("{} created successfully", title(kind)));
            Outcome::Created(kind, id)
        };
        Ok(outcome)
    }
}

async fn fetch<T: Record>(
    source: &dyn ListSource,
    endpoint: &inspectdesk_core::Endpoint,
) -> Result<Vec<Stored<T>>, SyncError> {
    let items = source.fetch_list(endpoint).await?;
    decode_list(items)
}

fn save<T: Record>(
    store: &mut RecordStore<T>,
    editing: Option<RecordId>,
    record: T,
) -> Result<RecordId, SessionError> {
    record.validate()?;
    match editing {
        Some(id) => {
            store.replace(&id, &record)?;
            Ok(id)
        }
        None => Ok(store.create(record)),
    }
}

fn project<T: Tabular>(store: &RecordStore<T>, query: &str, page: PageSize) -> TableView {
    table(search(store.list(), query), page)
}

fn detail<T: Tabular>(store: &RecordStore<T>, id: &RecordId) -> Result<DetailView, SessionError> {
    store
        .find_by_id(id)
        .map(T::detail)
        .ok_or_else(|| SessionError::NotFound {
            kind: T::KIND,
            id: id.clone(),
        })
}

fn title(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Document => "Document",
        EntityKind::Factory => "Factory",
        EntityKind::User => "User",
        EntityKind::Inspection => "Inspection",
        EntityKind::Followup => "Follow-up",
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "present" } else { "absent" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspectdesk_core::{Penalty, Status};
    use inspectdesk_sync::MemorySource;
    use serde_json::json;

    use crate::command::parse_line;

    fn run(session: &mut Session, lines: &str) -> Vec<Outcome> {
        lines
            .lines()
            .filter_map(|l| parse_line(l).unwrap())
            .map(|c| session.dispatch(c))
            .collect()
    }

    fn create_inspection(session: &mut Session, no: &str, penalty: bool) -> RecordId {
        let script = format!(
            "open-create-form inspection
             set-field no {no}
             set-field group A
             set-field inspection_date 2024-01-15
             set-field factory_name F
             set-field sector Garment
             set-field case_subject Routine
             toggle-penalty {}
             {}
             submit-form",
            if penalty { "on" } else { "off" },
            if penalty { "set-field penalty_format X" } else { "" },
        );
        match run(session, &script).pop() {
            Some(Outcome::Created(EntityKind::Inspection, id)) => id,
            other => panic!("inspection not created: {other:?}"),
        }
    }

    #[test]
    fn inspection_then_followup_end_to_end() {
        let mut session = Session::default();
        let ins = create_inspection(&mut session, "INS002", true);

        let outcomes = run(
            &mut session,
            &format!(
                "open-create-form followup
                 set-field no FLW002
                 select-original-inspection {ins}
                 set-field followup_date 2024-03-01
                 toggle-followup-result not-implemented
                 set-field followup_format Y
                 submit-form"
            ),
        );
        assert!(matches!(
            outcomes[2],
            Outcome::Preview(Preview::Loaded { has_penalty: true, .. })
        ));
        let Some(Outcome::Created(EntityKind::Followup, id)) = outcomes.last().cloned() else {
            panic!("follow-up not created: {outcomes:?}");
        };
        let f = &session.followups().find_by_id(&id).unwrap().record;
        assert_eq!(f.original_inspection_data.record.factory_name, "F");
        assert_eq!(f.result.detail().unwrap().followup_format, "Y");
        assert!(session.form().is_none());
    }

    #[test]
    fn followup_against_missing_inspection_changes_nothing() {
        let mut session = Session::default();
        let before = session.len(EntityKind::Followup);
        let outcomes = run(
            &mut session,
            "open-create-form followup
             set-field no FLW009
             select-original-inspection 404
             set-field followup_date 2024-03-01
             submit-form",
        );
        assert!(matches!(outcomes[2], Outcome::Preview(Preview::Missing(_))));
        assert!(matches!(outcomes.last(), Some(Outcome::Rejected(_))));
        assert_eq!(session.len(EntityKind::Followup), before);
        assert!(session.form().is_some());
    }

    #[test]
    fn no_penalty_original_is_a_note_then_a_block() {
        let mut session = Session::default();
        let ins = create_inspection(&mut session, "INS003", false);
        session.drain_notices();

        let outcomes = run(
            &mut session,
            &format!(
                "open-create-form followup
                 set-field no FLW003
                 set-field followup_date 2024-03-01
                 select-original-inspection {ins}"
            ),
        );
        assert!(matches!(
            outcomes.last(),
            Some(Outcome::Preview(Preview::Loaded { has_penalty: false, .. }))
        ));
        assert!(session.drain_notices().iter().all(|n| n.level != Level::Error));

        let submitted = session.dispatch(Command::SubmitForm);
        assert!(matches!(submitted, Outcome::Rejected(_)));
        assert!(session.followups().is_empty());
        let notices = session.drain_notices();
        assert_eq!(notices.last().unwrap().level, Level::Error);
    }

    #[test]
    fn penalty_toggle_clears_before_submit() {
        let mut session = Session::default();
        run(
            &mut session,
            "open-create-form inspection
             toggle-penalty on
             set-field penalty_format X
             set-field penalty_health Y
             toggle-penalty off",
        );
        let Some(OpenForm {
            body: FormBody::Inspection(form),
            ..
        }) = session.form()
        else {
            panic!("inspection form not open");
        };
        assert!(!form.penalty.is_active());
        assert!(form.penalty.detail().is_none());
    }

    #[test]
    fn invalid_submit_keeps_form_and_store() {
        let mut session = Session::default();
        let outcomes = run(
            &mut session,
            "open-create-form user
             set-field name Dara
             set-field phone 012345678
             set-field email not-an-email
             set-field password secret
             set-field role officer
             submit-form",
        );
        assert!(matches!(outcomes.last(), Some(Outcome::Rejected(_))));
        assert!(session.users().is_empty());
        assert!(session.form().is_some());

        let fixed = run(&mut session, "set-field email dara@mlvt.gov.kh\nsubmit-form");
        assert!(matches!(fixed.last(), Some(Outcome::Created(EntityKind::User, _))));
    }

    #[test]
    fn edit_preserves_identity_and_rederives_toggles() {
        let mut session = Session::default();
        let ins = create_inspection(&mut session, "INS004", true);
        let created_at = session.inspections().find_by_id(&ins).unwrap().created_at;

        let outcomes = run(
            &mut session,
            &format!(
                "open-edit-form inspection {ins}
                 set-field remarks revisit
                 toggle-penalty off
                 submit-form"
            ),
        );
        assert_eq!(
            outcomes[0],
            Outcome::FormOpened {
                kind: EntityKind::Inspection,
                editing: Some(ins.clone()),
                preview: None,
            }
        );
        assert_eq!(outcomes.last(), Some(&Outcome::Updated(EntityKind::Inspection, ins.clone())));
        let stored = session.inspections().find_by_id(&ins).unwrap();
        assert_eq!(stored.created_at, created_at);
        assert_eq!(stored.record.remarks, "revisit");
        assert_eq!(stored.record.penalty, Penalty::Absent);
    }

    #[test]
    fn editing_followup_keeps_snapshot() {
        let mut session = Session::default();
        let a = create_inspection(&mut session, "INS005", true);
        let b = create_inspection(&mut session, "INS006", true);
        let outcomes = run(
            &mut session,
            &format!(
                "open-create-form followup
                 set-field no FLW005
                 select-original-inspection {a}
                 set-field followup_date 2024-03-01
                 submit-form"
            ),
        );
        let Some(Outcome::Created(_, id)) = outcomes.last().cloned() else {
            panic!("not created");
        };
        run(
            &mut session,
            &format!(
                "open-edit-form followup {id}
                 select-original-inspection {b}
                 set-field conclusion done
                 submit-form"
            ),
        );
        let f = &session.followups().find_by_id(&id).unwrap().record;
        assert_eq!(f.original_inspection, a);
        assert_eq!(f.original().no, "INS005");
        assert_eq!(f.conclusion, "done");
    }

    #[test]
    fn deleting_inspection_keeps_followup_snapshot() {
        let mut session = Session::default();
        let ins = create_inspection(&mut session, "INS007", true);
        run(
            &mut session,
            &format!(
                "open-create-form followup
                 set-field no FLW007
                 select-original-inspection {ins}
                 set-field followup_date 2024-03-01
                 submit-form"
            ),
        );
        let before = session.followups().list()[0].clone();
        let deleted = session.dispatch(Command::ConfirmDelete(EntityKind::Inspection, ins.clone()));
        assert_eq!(deleted, Outcome::Deleted(EntityKind::Inspection, ins.clone()));
        assert_eq!(session.followups().list()[0], before);

        let again = session.dispatch(Command::ConfirmDelete(EntityKind::Inspection, ins));
        assert!(matches!(again, Outcome::Rejected(_)));
    }

    #[test]
    fn editing_followup_previews_its_original() {
        let mut session = Session::default();
        let ins = create_inspection(&mut session, "INS008", true);
        let outcomes = run(
            &mut session,
            &format!(
                "open-create-form followup
                 set-field no FLW008
                 select-original-inspection {ins}
                 set-field followup_date 2024-03-01
                 submit-form"
            ),
        );
        let Some(Outcome::Created(_, id)) = outcomes.last().cloned() else {
            panic!("not created");
        };

        let Outcome::FormOpened { preview, .. } =
            session.dispatch(Command::OpenEditForm(EntityKind::Followup, id.clone()))
        else {
            panic!("edit form not opened");
        };
        assert!(matches!(preview, Some(Preview::Loaded { has_penalty: true, .. })));
        session.dispatch(Command::CancelForm);

        let before = session.followups().find_by_id(&id).unwrap().clone();
        session.dispatch(Command::ConfirmDelete(EntityKind::Inspection, ins.clone()));
        session.drain_notices();
        let outcome = session.dispatch(Command::OpenEditForm(EntityKind::Followup, id.clone()));
        assert_eq!(
            outcome,
            Outcome::FormOpened {
                kind: EntityKind::Followup,
                editing: Some(id.clone()),
                preview: Some(Preview::Missing(ins.clone())),
            }
        );
        let notices = session.drain_notices();
        assert_eq!(notices.last().unwrap().message, format!("Inspection {ins} not found"));
        assert_eq!(session.followups().find_by_id(&id), Some(&before));
    }

    #[test]
    fn user_edit_form_starts_without_password() {
        let mut session = Session::default();
        let user: User = serde_json::from_value(json!({
            "name": "Dara",
            "phone": "012 345 678",
            "email": "dara@example.kh",
            "password": "secret",
            "role": "admin"
        }))
        .unwrap();
        let id = session.users.create(user);

        session.dispatch(Command::OpenEditForm(EntityKind::User, id.clone()));
        let Some(OpenForm {
            body: FormBody::User(form),
            ..
        }) = session.form()
        else {
            panic!("user form not open");
        };
        assert_eq!(form.password, "");
        assert_eq!(form.email, "dara@example.kh");
        assert_eq!(session.users().find_by_id(&id).unwrap().record.password, "secret");

        let refused = session.dispatch(Command::SubmitForm);
        assert!(matches!(refused, Outcome::Rejected(_)));
        assert!(session.form().is_some());
    }

    #[test]
    fn select_factory_fills_inspection() {
        let mut session = Session::default();
        session
            .import_factory_bytes(
                "លេខចូល,ឈ្មោះរោងចក្រ,Sector,ខេត្ត\nF-1,Nest Co,Bird nest,Kampot\n".as_bytes(),
            )
            .unwrap();
        let factory = session.factories().list()[0].id.clone();
        run(
            &mut session,
            &format!("open-create-form inspection\nselect-factory {factory}"),
        );
        let Some(OpenForm {
            body: FormBody::Inspection(form),
            ..
        }) = session.form()
        else {
            panic!("inspection form not open");
        };
        assert_eq!(form.draft.factory_name, "Nest Co");
        assert_eq!(form.draft.province, "Kampot");
    }

    #[test]
    fn wrong_form_for_toggle() {
        let mut session = Session::default();
        assert!(matches!(
            session.dispatch(Command::TogglePenalty(true)),
            Outcome::Rejected(_)
        ));
        run(&mut session, "open-create-form document");
        let outcome = session.dispatch(Command::ToggleFine(true));
        assert_eq!(
            outcome,
            Outcome::Rejected("toggle-fine does not apply to the document form".into())
        );
    }

    #[test]
    fn search_and_tabs() {
        let mut session = Session::default();
        create_inspection(&mut session, "INS001", true);
        create_inspection(&mut session, "INS010", false);

        let Outcome::Table(view) = session.dispatch(Command::Search {
            kind: EntityKind::Inspection,
            query: "ins001".into(),
        }) else {
            panic!("expected table");
        };
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].status, Some(Status::Pending));

        let Outcome::Table(view) = session.dispatch(Command::SwitchTab(Tab::Followup)) else {
            panic!("expected table");
        };
        assert_eq!(view.kind, EntityKind::Followup);
        assert_eq!(session.tab(), Tab::Followup);
        assert_eq!(session.penalty_candidates().len(), 1);
    }

    #[test]
    fn document_page_size() {
        let mut session = Session::default();
        let docs = (0..40)
            .map(|n: u64| Stored::new(RecordId::from(n), Document::default()))
            .collect();
        session.documents.ingest(docs);

        let Outcome::Table(view) = session.dispatch(Command::List(EntityKind::Document)) else {
            panic!("expected table");
        };
        assert_eq!((view.rows.len(), view.total), (15, 40));
        let Outcome::Table(view) = session.dispatch(Command::SetPageSize(PageSize::All)) else {
            panic!("expected table");
        };
        assert_eq!(view.rows.len(), 40);
    }

    #[test]
    fn export_and_import_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::default();
        let outcome = session.dispatch(Command::Export {
            kind: None,
            dir: dir.path().to_path_buf(),
        });
        let Outcome::Exported(paths) = outcome else {
            panic!("export failed: {outcome:?}");
        };
        assert_eq!(paths.len(), 5);

        session.dispatch(Command::DownloadTemplate(dir.path().to_path_buf()));
        let imported = session.dispatch(Command::ImportFactories(
            dir.path().join("factory_template.csv"),
        ));
        assert_eq!(imported, Outcome::Imported(1));
        let again = session.dispatch(Command::ImportFactories(
            dir.path().join("factory_template.csv"),
        ));
        assert_eq!(again, Outcome::Imported(1));
        assert_eq!(session.len(EntityKind::Factory), 2);
        let ids = session.factories().list();
        assert_ne!(ids[0].id, ids[1].id);
    }

    #[tokio::test]
    async fn load_remote_reports_each_list() {
        let source = MemorySource::new()
            .with_body("/doc", json!({"date": [{"id": 1, "no": "D-1", "ir": "IR-1"}]}))
            .with_body("/fac", json!({"message": "no data key"}));
        let mut session = Session::new(DashboardConfig::default());
        let report = session.load_remote(&source).await;

        assert_eq!(
            report.loaded,
            vec![(EntityKind::Document, 1), (EntityKind::Factory, 0)]
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, EntityKind::User);
        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, Level::Error);
    }

    #[tokio::test]
    async fn failed_load_keeps_local_work() {
        let mut session = Session::default();
        create_inspection(&mut session, "INS011", true);
        session.drain_notices();

        let report = session.load_remote(&MemorySource::new()).await;
        assert_eq!(report.failed.len(), 3);
        assert_eq!(session.drain_notices().len(), 3);
        assert_eq!(session.len(EntityKind::Inspection), 1);

        create_inspection(&mut session, "INS012", false);
        assert_eq!(session.len(EntityKind::Inspection), 2);
    }
}
