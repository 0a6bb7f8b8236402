//! Navigation orchestration
//!
//! Sequences metadata discovery, layout parsing, and data fetch in response
//! to surface intents. Failures never cross this boundary: lookups that miss
//! and fetches that fail are logged and the transition aborts, leaving prior
//! state in place.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::ControlConfig;
use crate::gateway::{LtrGateway, RemoteStore};
use crate::layout::{parse_form_xml, parse_layout_xml};
use crate::session::{Screen, SessionState};
use crate::surface::{DisplaySurface, SurfaceIntent};

/// Drives the grid-to-detail session: the single logical writer over
/// [`SessionState`].
///
/// Every transition takes `&mut self`, so there is no parallel mutation;
/// fetches suspend the caller, and their results are applied only when the
/// generation they started under is still current (a newer entity selection
/// wins over an in-flight load).
pub struct Orchestrator {
    config: ControlConfig,
    store: Arc<dyn RemoteStore>,
    gateway: LtrGateway,
    state: SessionState,
}

impl Orchestrator {
    pub fn new(config: ControlConfig, store: Arc<dyn RemoteStore>) -> Self {
        let gateway = build_gateway(&config, store.clone(), "");
        Orchestrator {
            config,
            store,
            gateway,
            state: SessionState::default(),
        }
    }

    /// Resolve the initial entity and run the first metadata load. With no
    /// resolvable entity this logs and leaves the session empty.
    pub async fn initialize(&mut self) {
        match self.config.resolve_target() {
            Some(entity) => self.select_entity(&entity).await,
            None => error!("no target entity resolvable from configuration; nothing to load"),
        }
    }

    /// Read-only view of the current session.
    pub fn session(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Render the current state onto a surface.
    pub fn present_to(&self, surface: &mut dyn DisplaySurface) {
        surface.present(&self.state);
    }

    /// Dispatch one surface intent.
    pub async fn handle(&mut self, intent: SurfaceIntent) {
        match intent {
            SurfaceIntent::EntitySelected(name) => self.select_entity(&name).await,
            SurfaceIntent::ViewSelected(view_id) => self.select_view(&view_id).await,
            SurfaceIntent::FormSelected(form_id) => self.select_form(&form_id),
            SurfaceIntent::RecordSelected(record_id) => self.select_record(&record_id).await,
            SurfaceIntent::BackRequested => self.back_to_grid(),
        }
    }

    /// Full reset onto a newly selected entity, then metadata reload.
    pub async fn select_entity(&mut self, name: &str) {
        let entity = self.config.canonicalize_entity(name);
        if entity.is_empty() {
            error!("empty entity selection ignored");
            return;
        }
        info!(entity = %entity, "entity selected");
        self.state.reset_for_entity(&entity);
        self.gateway = build_gateway(&self.config, self.store.clone(), &entity);
        self.load_metadata().await;
    }

    /// Fetch view and form definitions and apply the defaults: the first
    /// form's id is recorded without parsing (lazy until a record opens),
    /// the first view goes through the full view path.
    async fn load_metadata(&mut self) {
        let gen = self.state.generation();
        let views = self.gateway.list_views().await;
        let forms = self.gateway.list_forms().await;
        if !self.state.apply_metadata(gen, views, forms) {
            debug!("discarding metadata for a superseded entity selection");
            return;
        }
        if let Some(form_id) = self.state.forms.first().map(|form| form.id.clone()) {
            self.state.selected_form_id = Some(form_id);
        }
        if let Some(view_id) = self.state.views.first().map(|view| view.id.clone()) {
            self.select_view(&view_id).await;
        }
    }

    /// Apply a view: parse its layout into columns, then fetch its rows.
    /// A layout that yields no columns leaves the grid empty without a fetch.
    pub async fn select_view(&mut self, view_id: &str) {
        let Some(view) = self.state.find_view(view_id) else {
            error!(view_id = %view_id, "view not found in loaded metadata; selection ignored");
            return;
        };
        let fetch_xml = view.fetch_xml.clone();
        let columns = parse_layout_xml(&view.layout_xml);
        info!(view_id = %view_id, columns = columns.len(), "view selected");
        let gen = self.state.generation();
        self.state.set_view(view_id.to_owned(), columns);
        if self.state.grid_columns.is_empty() {
            debug!(view_id = %view_id, "view layout yields no columns; skipping row fetch");
            return;
        }
        let rows = self.gateway.fetch_rows(&fetch_xml, self.config.is_archive).await;
        if !self.state.apply_grid_rows(gen, rows) {
            debug!(view_id = %view_id, "discarding rows for a superseded selection");
        }
    }

    /// Parse the selected form's layout. Synchronous: the definition is
    /// already in memory.
    pub fn select_form(&mut self, form_id: &str) {
        let Some(form) = self.state.find_form(form_id) else {
            error!(form_id = %form_id, "form not found in loaded metadata; selection ignored");
            return;
        };
        let tabs = parse_form_xml(&form.form_xml);
        info!(form_id = %form_id, tabs = tabs.len(), "form selected");
        self.state.set_form(form_id.to_owned(), tabs);
    }

    /// Open a record in the detail screen. The in-memory grid is scanned
    /// first; a miss falls back to a single-record fetch (retained store
    /// when the archive flag is set). No resolution means no transition.
    pub async fn select_record(&mut self, record_id: &str) {
        let gen = self.state.generation();
        let key_fields = self.primary_key_candidates();
        let cached = self.state.grid_row_matching(record_id, &key_fields).cloned();
        let record = match cached {
            Some(row) => {
                debug!(record_id = %record_id, "record resolved from grid data");
                Some(row)
            }
            None => self.gateway.fetch_record(record_id, self.config.is_archive).await,
        };
        if !self.state.is_current(gen) {
            debug!(record_id = %record_id, "discarding record for a superseded selection");
            return;
        }
        let Some(record) = record else {
            error!(record_id = %record_id, "record not found in grid or store; staying on grid");
            return;
        };
        if self.state.form_tabs.is_empty() {
            if let Some(form_id) = self.state.selected_form_id.clone() {
                self.select_form(&form_id);
            }
        }
        info!(record_id = %record_id, "record opened");
        self.state.open_detail(record);
    }

    /// Return to the grid, dropping the open record. Grid contents are
    /// preserved, not refetched.
    pub fn back_to_grid(&mut self) {
        if self.state.screen == Screen::Detail {
            info!("returning to grid");
        }
        self.state.back_to_grid();
    }

    fn primary_key_candidates(&self) -> Vec<String> {
        let entity = self.state.selected_entity.as_deref().unwrap_or_default();
        self.config.primary_key_candidates(entity)
    }
}

fn build_gateway(config: &ControlConfig, store: Arc<dyn RemoteStore>, entity: &str) -> LtrGateway {
    LtrGateway::new(store, entity, config.primary_key_override())
}
