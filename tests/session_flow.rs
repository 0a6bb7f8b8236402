//! End-to-end navigation scenarios over a scripted in-memory store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use ltr_display_core::{
    ControlConfig, DisplaySurface, Orchestrator, RecordBag, RemoteStore, Screen, SessionState,
    StoreError, SurfaceIntent,
};

const INCIDENT_FETCH: &str = r#"<fetch version="1.0"><entity name="incident"/></fetch>"#;
const INCIDENT_LAYOUT: &str = r#"<grid name="resultset" object="112" jump="title" select="1"><row name="result" id="incidentid"><cell name="title" width="300"/><cell name="createdon" width="125"/></row></grid>"#;
const INCIDENT_FORM: &str = r#"<form><tabs><tab name="general" id="{t1}"><labels><label description="General"/></labels><columns><column width="100%"><sections><section name="main" id="{s1}"><labels><label description="Case"/></labels><rows><row><cell id="{c1}"><labels><label description="Title"/></labels><control id="title" datafieldname="title"/></cell></row></rows></section></sections></column></columns></tab></tabs></form>"#;

const ACCOUNT_FETCH: &str = r#"<fetch version="1.0"><entity name="account"/></fetch>"#;
const ACCOUNT_LAYOUT: &str = r#"<grid name="resultset" object="1"><row name="result" id="accountid"><cell name="name" width="200"/></row></grid>"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

/// One store operation as the stub saw it.
#[derive(Debug, Clone, PartialEq)]
enum StoreCall {
    List { collection: String, filter: String },
    Fetch { entity: String, fetch_xml: String },
    Retrieve { entity: String, id: String },
}

/// Scripted store: canned metadata per entity, canned rows, and a log of
/// every call received.
#[derive(Default)]
struct ScriptedStore {
    saved_views: HashMap<String, Vec<RecordBag>>,
    main_forms: HashMap<String, Vec<RecordBag>>,
    grid_rows: Vec<RecordBag>,
    retained_rows: Vec<RecordBag>,
    live_records: HashMap<String, RecordBag>,
    fail_view_list: bool,
    calls: Mutex<Vec<StoreCall>>,
}

impl ScriptedStore {
    fn log(&self, call: StoreCall) {
        self.calls.lock().expect("call log").push(call);
    }

    fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("call log").clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().expect("call log").len()
    }
}

#[async_trait]
impl RemoteStore for ScriptedStore {
    async fn list_collection(
        &self,
        collection: &str,
        filter: &str,
        _columns: &[&str],
    ) -> Result<Vec<RecordBag>, StoreError> {
        self.log(StoreCall::List {
            collection: collection.to_owned(),
            filter: filter.to_owned(),
        });
        let by_entity = match collection {
            "savedquery" => {
                if self.fail_view_list {
                    return Err(StoreError::Transport("connection refused".into()));
                }
                &self.saved_views
            }
            "systemform" => &self.main_forms,
            _ => return Ok(Vec::new()),
        };
        Ok(by_entity
            .iter()
            .find(|(entity, _)| filter.contains(&format!("'{entity}'")))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn query_by_fetch(
        &self,
        entity: &str,
        fetch_xml: &str,
    ) -> Result<Vec<RecordBag>, StoreError> {
        self.log(StoreCall::Fetch {
            entity: entity.to_owned(),
            fetch_xml: fetch_xml.to_owned(),
        });
        if fetch_xml.contains(r#"datasource="retained""#) {
            Ok(self.retained_rows.clone())
        } else {
            Ok(self.grid_rows.clone())
        }
    }

    async fn retrieve_by_id(&self, entity: &str, id: &str) -> Result<RecordBag, StoreError> {
        self.log(StoreCall::Retrieve {
            entity: entity.to_owned(),
            id: id.to_owned(),
        });
        self.live_records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.to_owned(),
                id: id.to_owned(),
            })
    }
}

fn record(value: serde_json::Value) -> RecordBag {
    RecordBag::from_value(value).expect("object literal")
}

fn view_row(id: &str, name: &str, fetch_xml: &str, layout_xml: &str) -> RecordBag {
    record(json!({
        "savedqueryid": id,
        "name": name,
        "fetchxml": fetch_xml,
        "layoutxml": layout_xml,
    }))
}

fn form_row(id: &str, name: &str, form_xml: &str) -> RecordBag {
    record(json!({ "formid": id, "name": name, "formxml": form_xml, "type": 2 }))
}

fn incident_row(id: &str, title: &str) -> RecordBag {
    record(json!({
        "incidentid": id,
        "title": title,
        "prioritycode": 1,
        "prioritycode@OData.Community.Display.V1.FormattedValue": "High",
    }))
}

fn last_fetch_xml(calls: &[StoreCall]) -> String {
    calls
        .iter()
        .rev()
        .find_map(|call| match call {
            StoreCall::Fetch { fetch_xml, .. } => Some(fetch_xml.clone()),
            _ => None,
        })
        .expect("a fetch call")
}

/// Standard fixture: incident with two views, one form, two grid rows.
struct Harness {
    store: Arc<ScriptedStore>,
    orchestrator: Orchestrator,
    view_ids: Vec<String>,
    form_id: String,
}

impl Harness {
    async fn incident(config: ControlConfig) -> Harness {
        init_tracing();
        let view_ids = vec![Uuid::new_v4().to_string(), Uuid::new_v4().to_string()];
        let form_id = Uuid::new_v4().to_string();
        let account_view = Uuid::new_v4().to_string();

        let store = Arc::new(ScriptedStore {
            saved_views: HashMap::from([
                (
                    "incident".to_owned(),
                    vec![
                        view_row(&view_ids[0], "Active Incidents", INCIDENT_FETCH, INCIDENT_LAYOUT),
                        view_row(&view_ids[1], "All Incidents", INCIDENT_FETCH, INCIDENT_LAYOUT),
                    ],
                ),
                (
                    "account".to_owned(),
                    vec![view_row(&account_view, "All Accounts", ACCOUNT_FETCH, ACCOUNT_LAYOUT)],
                ),
            ]),
            main_forms: HashMap::from([(
                "incident".to_owned(),
                vec![form_row(&form_id, "Incident Main", INCIDENT_FORM)],
            )]),
            grid_rows: vec![
                incident_row("abc-123", "Printer jam"),
                incident_row("def-456", "Email outage"),
            ],
            ..ScriptedStore::default()
        });

        let mut orchestrator = Orchestrator::new(config, store.clone());
        orchestrator.initialize().await;
        Harness {
            store,
            orchestrator,
            view_ids,
            form_id,
        }
    }

    fn session(&self) -> &SessionState {
        self.orchestrator.session()
    }
}

#[tokio::test]
async fn test_entity_selection_loads_defaults() {
    let h = Harness::incident(ControlConfig::new("incident")).await;
    let session = h.session();

    assert_eq!(session.selected_entity.as_deref(), Some("incident"));
    assert_eq!(session.views.len(), 2);
    assert_eq!(session.forms.len(), 1);
    assert_eq!(session.selected_view_id.as_deref(), Some(h.view_ids[0].as_str()));
    assert_eq!(session.selected_form_id.as_deref(), Some(h.form_id.as_str()));
    assert_eq!(session.grid_columns.len(), 2);
    assert_eq!(session.grid_columns[0].name.as_deref(), Some("title"));
    assert_eq!(session.grid_data.len(), 2);
    // Form parsing stays lazy until a record is opened.
    assert!(session.form_tabs.is_empty());
    assert_eq!(session.screen, Screen::Grid);

    assert_eq!(
        h.store.calls(),
        vec![
            StoreCall::List {
                collection: "savedquery".into(),
                filter: "returnedtypecode eq 'incident' and statecode eq 0".into(),
            },
            StoreCall::List {
                collection: "systemform".into(),
                filter: "objecttypecode eq 'incident' and type eq 2".into(),
            },
            StoreCall::Fetch {
                entity: "incident".into(),
                fetch_xml: INCIDENT_FETCH.into(),
            },
        ]
    );
}

#[tokio::test]
async fn test_record_selected_from_grid_cache_skips_the_store() {
    let mut h = Harness::incident(ControlConfig::new("incident")).await;
    let calls_before = h.store.call_count();

    h.orchestrator
        .handle(SurfaceIntent::RecordSelected("abc-123".into()))
        .await;

    let session = h.session();
    assert_eq!(session.screen, Screen::Detail);
    let selected = session.selected_record.as_ref().expect("record open");
    assert!(selected.matches_id("incidentid", "abc-123"));
    // Opening a record triggers the lazy form parse.
    assert_eq!(session.form_tabs.len(), 1);
    assert_eq!(session.form_tabs[0].label, "General");
    // Resolved from the in-memory grid: no store traffic.
    assert_eq!(h.store.call_count(), calls_before);
}

#[tokio::test]
async fn test_record_selected_miss_with_null_fetch_stays_on_grid() {
    let mut h = Harness::incident(ControlConfig::new("incident")).await;

    h.orchestrator
        .handle(SurfaceIntent::RecordSelected("zzz".into()))
        .await;

    let session = h.session();
    assert_eq!(session.screen, Screen::Grid);
    assert!(session.selected_record.is_none());
    assert_eq!(
        h.store.calls().last(),
        Some(&StoreCall::Retrieve {
            entity: "incident".into(),
            id: "zzz".into(),
        })
    );
}

#[tokio::test]
async fn test_record_selected_falls_back_to_live_retrieve() {
    init_tracing();
    let store = Arc::new(ScriptedStore {
        saved_views: HashMap::from([(
            "incident".to_owned(),
            vec![view_row("v1", "Active", INCIDENT_FETCH, INCIDENT_LAYOUT)],
        )]),
        live_records: HashMap::from([(
            "ghi-789".to_owned(),
            incident_row("ghi-789", "Archived elsewhere"),
        )]),
        ..ScriptedStore::default()
    });
    let mut orchestrator = Orchestrator::new(ControlConfig::new("incident"), store.clone());
    orchestrator.initialize().await;

    orchestrator
        .handle(SurfaceIntent::RecordSelected("ghi-789".into()))
        .await;

    assert_eq!(orchestrator.session().screen, Screen::Detail);
    let selected = orchestrator.session().selected_record.as_ref().expect("record");
    assert!(selected.matches_id("incidentid", "ghi-789"));
}

#[tokio::test]
async fn test_view_selected_with_unknown_id_preserves_state() {
    let mut h = Harness::incident(ControlConfig::new("incident")).await;
    let before_view = h.session().selected_view_id.clone();
    let before_columns = h.session().grid_columns.clone();
    let before_rows = h.session().grid_data.len();
    let calls_before = h.store.call_count();

    h.orchestrator
        .handle(SurfaceIntent::ViewSelected("bad-id".into()))
        .await;

    let session = h.session();
    assert_eq!(session.selected_view_id, before_view);
    assert_eq!(session.grid_columns, before_columns);
    assert_eq!(session.grid_data.len(), before_rows);
    // No fetch was issued for the aborted transition.
    assert_eq!(h.store.call_count(), calls_before);
}

#[tokio::test]
async fn test_form_selected_with_unknown_id_preserves_state() {
    let mut h = Harness::incident(ControlConfig::new("incident")).await;

    h.orchestrator
        .handle(SurfaceIntent::FormSelected("bad-id".into()))
        .await;

    let session = h.session();
    assert_eq!(session.selected_form_id.as_deref(), Some(h.form_id.as_str()));
    assert!(session.form_tabs.is_empty());
}

#[tokio::test]
async fn test_switching_views_refetches_rows() {
    let mut h = Harness::incident(ControlConfig::new("incident")).await;
    let second = h.view_ids[1].clone();
    let calls_before = h.store.call_count();

    h.orchestrator
        .handle(SurfaceIntent::ViewSelected(second.clone()))
        .await;

    let session = h.session();
    assert_eq!(session.selected_view_id.as_deref(), Some(second.as_str()));
    assert_eq!(session.grid_data.len(), 2);
    assert_eq!(h.store.call_count(), calls_before + 1);
}

#[tokio::test]
async fn test_view_with_columnless_layout_skips_the_row_fetch() {
    init_tracing();
    let view_id = Uuid::new_v4().to_string();
    let store = Arc::new(ScriptedStore {
        saved_views: HashMap::from([(
            "incident".to_owned(),
            vec![view_row(
                &view_id,
                "Broken Layout",
                INCIDENT_FETCH,
                r#"<grid name="resultset"><row name="result" id="incidentid"/></grid>"#,
            )],
        )]),
        ..ScriptedStore::default()
    });
    let mut orchestrator = Orchestrator::new(ControlConfig::new("incident"), store.clone());
    orchestrator.initialize().await;

    let session = orchestrator.session();
    assert_eq!(session.selected_view_id.as_deref(), Some(view_id.as_str()));
    assert!(session.grid_columns.is_empty());
    assert!(session.grid_data.is_empty());
    // Two metadata lists, no row fetch.
    assert_eq!(store.call_count(), 2);
    assert!(!store
        .calls()
        .iter()
        .any(|call| matches!(call, StoreCall::Fetch { .. })));
}

#[tokio::test]
async fn test_partial_metadata_applies_forms_when_views_fail() {
    init_tracing();
    let form_id = Uuid::new_v4().to_string();
    let store = Arc::new(ScriptedStore {
        fail_view_list: true,
        main_forms: HashMap::from([(
            "incident".to_owned(),
            vec![form_row(&form_id, "Incident Main", INCIDENT_FORM)],
        )]),
        ..ScriptedStore::default()
    });
    let mut orchestrator = Orchestrator::new(ControlConfig::new("incident"), store);
    orchestrator.initialize().await;

    let session = orchestrator.session();
    assert!(session.views.is_empty());
    assert_eq!(session.forms.len(), 1);
    assert_eq!(session.selected_form_id.as_deref(), Some(form_id.as_str()));
    assert_eq!(session.selected_view_id, None);
    assert!(session.grid_columns.is_empty());
    assert_eq!(session.screen, Screen::Grid);
}

#[tokio::test]
async fn test_archive_record_fetch_uses_the_retained_source() {
    init_tracing();
    let store = Arc::new(ScriptedStore {
        saved_views: HashMap::from([(
            "incident".to_owned(),
            vec![view_row("v1", "Active", INCIDENT_FETCH, INCIDENT_LAYOUT)],
        )]),
        retained_rows: vec![incident_row("old-1", "Case from 2019")],
        ..ScriptedStore::default()
    });
    let config = ControlConfig {
        is_archive: true,
        ..ControlConfig::new("incident")
    };
    let mut orchestrator = Orchestrator::new(config, store.clone());
    orchestrator.initialize().await;

    orchestrator
        .handle(SurfaceIntent::RecordSelected("old-1".into()))
        .await;

    assert_eq!(orchestrator.session().screen, Screen::Detail);
    let retained_call = last_fetch_xml(&store.calls());
    assert!(retained_call.contains(r#"datasource="retained""#));
    assert!(retained_call.contains(r#"attribute="incidentid" operator="eq" value="old-1""#));
}

#[tokio::test]
async fn test_back_returns_to_grid_without_refetching() {
    let mut h = Harness::incident(ControlConfig::new("incident")).await;
    h.orchestrator
        .handle(SurfaceIntent::RecordSelected("abc-123".into()))
        .await;
    assert_eq!(h.session().screen, Screen::Detail);
    let calls_before = h.store.call_count();

    h.orchestrator.handle(SurfaceIntent::BackRequested).await;

    let session = h.session();
    assert_eq!(session.screen, Screen::Grid);
    assert!(session.selected_record.is_none());
    assert_eq!(session.grid_data.len(), 2);
    assert_eq!(h.store.call_count(), calls_before);
}

#[tokio::test]
async fn test_entity_change_resets_and_reloads() {
    let mut h = Harness::incident(ControlConfig::new("incident")).await;
    h.orchestrator
        .handle(SurfaceIntent::RecordSelected("abc-123".into()))
        .await;

    h.orchestrator
        .handle(SurfaceIntent::EntitySelected("account".into()))
        .await;

    let session = h.session();
    assert_eq!(session.selected_entity.as_deref(), Some("account"));
    assert_eq!(session.views.len(), 1);
    assert!(session.forms.is_empty());
    assert_eq!(session.selected_form_id, None);
    assert!(session.form_tabs.is_empty());
    assert!(session.selected_record.is_none());
    assert_eq!(session.screen, Screen::Grid);
    assert_eq!(session.grid_columns.len(), 1);
    assert_eq!(session.grid_columns[0].name.as_deref(), Some("name"));
}

#[tokio::test]
async fn test_entity_selection_canonicalizes_against_options() {
    let config = ControlConfig {
        entity_options: Some("incident:Cases,account:Accounts".into()),
        ..ControlConfig::new("incident")
    };
    let mut h = Harness::incident(config).await;

    h.orchestrator
        .handle(SurfaceIntent::EntitySelected("Accounts".into()))
        .await;

    assert_eq!(h.session().selected_entity.as_deref(), Some("account"));
}

#[tokio::test]
async fn test_unresolvable_entity_loads_nothing() {
    init_tracing();
    let store = Arc::new(ScriptedStore::default());
    let mut orchestrator = Orchestrator::new(ControlConfig::default(), store.clone());
    orchestrator.initialize().await;

    assert_eq!(orchestrator.session().selected_entity, None);
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_configured_primary_key_drives_grid_matching() {
    let config = ControlConfig {
        primary_key_field: Some("title".into()),
        ..ControlConfig::new("incident")
    };
    let mut h = Harness::incident(config).await;

    // "abc-123" is the incidentid, but matching now goes through `title`
    // only, so resolution falls back to the store and misses.
    h.orchestrator
        .handle(SurfaceIntent::RecordSelected("abc-123".into()))
        .await;
    assert_eq!(h.session().screen, Screen::Grid);

    h.orchestrator
        .handle(SurfaceIntent::RecordSelected("Printer jam".into()))
        .await;
    assert_eq!(h.session().screen, Screen::Detail);
}

/// Captures what a rendering surface would see.
#[derive(Default)]
struct RecordingSurface {
    screens: Vec<Screen>,
    last_columns: usize,
}

impl DisplaySurface for RecordingSurface {
    fn present(&mut self, session: &SessionState) {
        self.screens.push(session.screen);
        self.last_columns = session.grid_columns.len();
    }
}

#[tokio::test]
async fn test_present_to_hands_the_surface_the_current_state() {
    let mut h = Harness::incident(ControlConfig::new("incident")).await;
    let mut surface = RecordingSurface::default();

    h.orchestrator.present_to(&mut surface);
    h.orchestrator
        .handle(SurfaceIntent::RecordSelected("abc-123".into()))
        .await;
    h.orchestrator.present_to(&mut surface);

    assert_eq!(surface.screens, vec![Screen::Grid, Screen::Detail]);
    assert_eq!(surface.last_columns, 2);
}
