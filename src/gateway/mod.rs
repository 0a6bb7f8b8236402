//! Data Access Gateway
//!
//! Fetches view definitions, form definitions, and records for one entity,
//! choosing between the live and retained data sources where supported.
//! Nothing here fails outward: every store error is caught, logged, and
//! degraded to an empty list or `None` so the session always has renderable
//! state.

mod store;
#[cfg(feature = "webapi")]
mod webapi;

pub use store::{RemoteStore, StoreError};
#[cfg(feature = "webapi")]
pub use webapi::{WebApiConfig, WebApiStore};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::record::RecordBag;

const VIEW_COLLECTION: &str = "savedquery";
const FORM_COLLECTION: &str = "systemform";
/// Form `type` attribute value for MAIN forms.
const MAIN_FORM_TYPE: u8 = 2;

/// One saved list layout (query + column layout) for an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub id: String,
    pub name: String,
    /// Opaque FetchXML for the rows this view shows.
    pub fetch_xml: String,
    /// Opaque layout XML describing the view's columns.
    pub layout_xml: String,
}

impl ViewDefinition {
    fn from_row(row: &RecordBag) -> Option<ViewDefinition> {
        Some(ViewDefinition {
            id: row.text("savedqueryid")?.to_owned(),
            name: row.text("name").unwrap_or_default().to_owned(),
            fetch_xml: row.text("fetchxml").unwrap_or_default().to_owned(),
            layout_xml: row.text("layoutxml").unwrap_or_default().to_owned(),
        })
    }
}

/// One saved detail layout for an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: String,
    pub name: String,
    /// Opaque form XML describing tabs, sections, rows, and cells.
    pub form_xml: String,
}

impl FormDefinition {
    fn from_row(row: &RecordBag) -> Option<FormDefinition> {
        Some(FormDefinition {
            id: row.text("formid")?.to_owned(),
            name: row.text("name").unwrap_or_default().to_owned(),
            form_xml: row.text("formxml").unwrap_or_default().to_owned(),
        })
    }
}

/// Entity-scoped data access facade.
///
/// Constructed per selected entity; the orchestrator rebuilds it whenever
/// the entity changes.
pub struct LtrGateway {
    store: Arc<dyn RemoteStore>,
    entity: String,
    primary_key: String,
}

impl LtrGateway {
    /// `primary_key` overrides the `<entity>id` naming convention for
    /// retained single-record queries.
    pub fn new(
        store: Arc<dyn RemoteStore>,
        entity: impl Into<String>,
        primary_key: Option<String>,
    ) -> Self {
        let entity = entity.into();
        let primary_key = primary_key.unwrap_or_else(|| format!("{entity}id"));
        debug!(entity = %entity, primary_key = %primary_key, "gateway initialized");
        LtrGateway {
            store,
            entity,
            primary_key,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Active saved views for the entity, in store order.
    pub async fn list_views(&self) -> Vec<ViewDefinition> {
        let filter = format!("returnedtypecode eq '{}' and statecode eq 0", self.entity);
        let rows = match self
            .store
            .list_collection(
                VIEW_COLLECTION,
                &filter,
                &["savedqueryid", "name", "fetchxml", "layoutxml"],
            )
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!(entity = %self.entity, error = %err, "failed to list saved views");
                return Vec::new();
            }
        };
        let mut views = Vec::new();
        for row in &rows {
            match ViewDefinition::from_row(row) {
                Some(view) => views.push(view),
                None => warn!(entity = %self.entity, "skipping saved view row without savedqueryid"),
            }
        }
        info!(entity = %self.entity, count = views.len(), "loaded saved views");
        views
    }

    /// MAIN detail forms for the entity, in store order.
    pub async fn list_forms(&self) -> Vec<FormDefinition> {
        let filter = format!(
            "objecttypecode eq '{}' and type eq {}",
            self.entity, MAIN_FORM_TYPE
        );
        let rows = match self
            .store
            .list_collection(FORM_COLLECTION, &filter, &["formid", "name", "formxml", "type"])
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!(entity = %self.entity, error = %err, "failed to list forms");
                return Vec::new();
            }
        };
        let mut forms = Vec::new();
        for row in &rows {
            match FormDefinition::from_row(row) {
                Some(form) => forms.push(form),
                None => warn!(entity = %self.entity, "skipping form row without formid"),
            }
        }
        info!(entity = %self.entity, count = forms.len(), "loaded forms");
        forms
    }

    /// Grid rows, by executing the selected view's fetch query.
    ///
    /// The archive flag is accepted and logged, but the query still runs
    /// against the live collection; retention scoping is only wired up for
    /// single-record retrieval.
    /// TODO: route multi-row fetches to the retained data source once the
    /// retention endpoint supports FetchXML paging for it.
    pub async fn fetch_rows(&self, fetch_xml: &str, use_archive: bool) -> Vec<RecordBag> {
        if use_archive {
            debug!(entity = %self.entity, "archive flag set; multi-row fetch still uses the live source");
        }
        match self.store.query_by_fetch(&self.entity, fetch_xml).await {
            Ok(rows) => {
                info!(entity = %self.entity, count = rows.len(), "fetched grid rows");
                rows
            }
            Err(err) => {
                error!(entity = %self.entity, error = %err, "grid row fetch failed");
                Vec::new()
            }
        }
    }

    /// A single record by id: from the retained store when `use_archive` is
    /// set, else a direct retrieve from the live store.
    pub async fn fetch_record(&self, id: &str, use_archive: bool) -> Option<RecordBag> {
        if use_archive {
            let fetch_xml = self.retained_record_fetch(id);
            match self.store.query_by_fetch(&self.entity, &fetch_xml).await {
                Ok(rows) => {
                    if rows.is_empty() {
                        warn!(entity = %self.entity, record_id = %id, "record not in retained store");
                    }
                    rows.into_iter().next()
                }
                Err(err) => {
                    error!(entity = %self.entity, record_id = %id, error = %err, "retained record fetch failed");
                    None
                }
            }
        } else {
            match self.store.retrieve_by_id(&self.entity, id).await {
                Ok(row) => Some(row),
                Err(StoreError::NotFound { .. }) => {
                    debug!(entity = %self.entity, record_id = %id, "record not found in live store");
                    None
                }
                Err(err) => {
                    error!(entity = %self.entity, record_id = %id, error = %err, "record retrieval failed");
                    None
                }
            }
        }
    }

    /// Single-record FetchXML against the long-term retention data source.
    fn retained_record_fetch(&self, id: &str) -> String {
        format!(
            r#"<fetch version="1.0" output-format="xml-platform" mapping="logical" distinct="false" datasource="retained"><entity name="{entity}"><all-attributes/><filter type="and"><condition attribute="{key}" operator="eq" value="{id}"/></filter></entity></fetch>"#,
            entity = xml_escape(&self.entity),
            key = xml_escape(&self.primary_key),
            id = xml_escape(id),
        )
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
