//! Session state for the grid-to-detail navigation
//!
//! One explicit state struct owned by the orchestrator. The display surface
//! observes it through a shared borrow, so every snapshot it sees is
//! immutable by construction; mutation happens only through the transition
//! methods.

mod orchestrator;

pub use orchestrator::Orchestrator;

use serde::{Deserialize, Serialize};

use crate::gateway::{FormDefinition, ViewDefinition};
use crate::layout::{FormTab, GridColumn};
use crate::record::RecordBag;

/// Which screen the surface should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Grid,
    Detail,
}

impl Default for Screen {
    fn default() -> Self {
        Screen::Grid
    }
}

/// Monotonic marker for the current entity selection. Results of an async
/// step carry the generation they started under; application is refused once
/// a newer selection exists, so a stale response can never overwrite newer
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Generation(u64);

impl Generation {
    fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

/// Renderable session state.
///
/// `screen == Detail` always carries a record: back-navigation clears
/// `selected_record` together with the screen change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub selected_entity: Option<String>,
    pub views: Vec<ViewDefinition>,
    pub forms: Vec<FormDefinition>,
    pub selected_view_id: Option<String>,
    pub selected_form_id: Option<String>,
    pub grid_columns: Vec<GridColumn>,
    pub grid_data: Vec<RecordBag>,
    /// Parsed detail layout; stays empty until a form is actually needed.
    pub form_tabs: Vec<FormTab>,
    pub screen: Screen,
    pub selected_record: Option<RecordBag>,
    #[serde(skip)]
    generation: Generation,
}

impl SessionState {
    pub(crate) fn generation(&self) -> Generation {
        self.generation
    }

    pub(crate) fn is_current(&self, gen: Generation) -> bool {
        self.generation == gen
    }

    /// Full reset onto a newly selected entity. Bumps the generation so any
    /// in-flight result for the previous selection is discarded on arrival.
    pub(crate) fn reset_for_entity(&mut self, entity: &str) {
        *self = SessionState {
            selected_entity: Some(entity.to_owned()),
            generation: self.generation.next(),
            ..SessionState::default()
        };
    }

    /// Apply metadata fetched under `gen`. Returns false (and changes
    /// nothing) when the selection has been superseded.
    pub(crate) fn apply_metadata(
        &mut self,
        gen: Generation,
        views: Vec<ViewDefinition>,
        forms: Vec<FormDefinition>,
    ) -> bool {
        if !self.is_current(gen) {
            return false;
        }
        self.views = views;
        self.forms = forms;
        true
    }

    /// Apply a view selection and its parsed columns; rows are cleared until
    /// the fetch lands.
    pub(crate) fn set_view(&mut self, view_id: String, columns: Vec<GridColumn>) {
        self.selected_view_id = Some(view_id);
        self.grid_columns = columns;
        self.grid_data.clear();
    }

    /// Apply rows fetched under `gen`; false when superseded.
    pub(crate) fn apply_grid_rows(&mut self, gen: Generation, rows: Vec<RecordBag>) -> bool {
        if !self.is_current(gen) {
            return false;
        }
        self.grid_data = rows;
        true
    }

    pub(crate) fn set_form(&mut self, form_id: String, tabs: Vec<FormTab>) {
        self.selected_form_id = Some(form_id);
        self.form_tabs = tabs;
    }

    pub(crate) fn open_detail(&mut self, record: RecordBag) {
        self.selected_record = Some(record);
        self.screen = Screen::Detail;
    }

    pub(crate) fn back_to_grid(&mut self) {
        self.selected_record = None;
        self.screen = Screen::Grid;
    }

    pub(crate) fn find_view(&self, view_id: &str) -> Option<&ViewDefinition> {
        self.views.iter().find(|view| view.id == view_id)
    }

    pub(crate) fn find_form(&self, form_id: &str) -> Option<&FormDefinition> {
        self.forms.iter().find(|form| form.id == form_id)
    }

    /// First grid row whose value under any candidate key field equals `id`.
    pub(crate) fn grid_row_matching(&self, id: &str, key_fields: &[String]) -> Option<&RecordBag> {
        self.grid_data
            .iter()
            .find(|row| key_fields.iter().any(|field| row.matches_id(field, id)))
    }
}
