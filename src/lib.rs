//! Grid-to-detail viewer core for live and long-term-retention (LTR) records
//!
//! Plugs into a host business-application runtime: given a target entity and
//! an archive flag, it discovers the entity's saved views and MAIN forms,
//! parses their layout dialects, fetches matching records, and drives a
//! grid ↔ detail navigation session that a display surface renders.
//!
//! Three cooperating pieces:
//! - [`layout`]: the declarative-layout interpreter for the two XML dialects
//!   (view layout XML → columns, form XML → tab/section/row/cell tree)
//! - [`gateway`]: the async data access layer over a [`RemoteStore`],
//!   degrading to empty results instead of failing
//! - [`session`]: the navigation state machine the surface observes and
//!   drives through [`SurfaceIntent`]s
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ltr_display_core::{
//!     ControlConfig, Orchestrator, SurfaceIntent, WebApiConfig, WebApiStore,
//! };
//!
//! # async fn demo() -> Result<(), ltr_display_core::StoreError> {
//! let store = Arc::new(WebApiStore::new(WebApiConfig::new("https://org.example.com"))?);
//! let mut orchestrator = Orchestrator::new(ControlConfig::new("incident"), store);
//!
//! // Load metadata, select the first view, and fetch its rows.
//! orchestrator.initialize().await;
//!
//! // A surface reports a row activation; the session moves to the detail
//! // screen with the resolved record.
//! orchestrator.handle(SurfaceIntent::RecordSelected("abc-123".into())).await;
//! println!("{:?}", orchestrator.session().screen);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gateway;
pub mod layout;
pub mod record;
pub mod session;
pub mod surface;

pub use config::{parse_entity_options, ControlConfig, EntityOption};
pub use gateway::{FormDefinition, LtrGateway, RemoteStore, StoreError, ViewDefinition};
#[cfg(feature = "webapi")]
pub use gateway::{WebApiConfig, WebApiStore};
pub use layout::{
    parse_form_xml, parse_layout_xml, FormCell, FormRow, FormSection, FormTab, GridColumn,
};
pub use record::{FieldValue, RecordBag, FORMATTED_VALUE_SUFFIX};
pub use session::{Orchestrator, Screen, SessionState};
pub use surface::{display_text, DisplaySurface, SurfaceIntent, VALUE_PLACEHOLDER};
