#![deny(rust_2018_idioms)]
//! Field-mapping resolution and staged configuration for search widgets.
//!
//! A [`SchemaIndex`] and a widget kind's [`TypeConstraint`] decide which
//! fields a widget may target; [`FieldResolver`] expands chosen roots into
//! the concrete indexed fields and relevance weights; [`WidgetEditor`] stages
//! edits in an [`EditSession`] and commits them atomically to a
//! [`ConfigStore`].

mod config;
mod constraint;
mod domain;
mod error;
mod io;
mod options;
mod resolver;
mod schema;
mod session;
mod store;
mod workbench;

pub use config::{ConfigFactory, WidgetConfig, config_json_schema, parse_widget_config};
pub use constraint::{
    AuxKind, AuxProperty, AuxValue, ConstraintRegistry, Eligibility, TypeConstraint,
};
pub use domain::{
    RawFieldMapping, RawSubField, SchemaField, SubField, mapping_document_schema, parse_mappings,
};
pub use error::{EngineError, Result};
pub use io::{DocumentFormat, load_document, parse_document_str, render_document};
pub use options::{DEFAULT_FIELD_WEIGHT, DEFAULT_NOTICE_TTL, EngineOptions};
pub use resolver::{
    DataField, FieldResolver, KEYWORD_SUB_FIELD, ResolvedBinding, SUB_FIELD_WEIGHT, parse_weight,
};
pub use schema::SchemaIndex;
pub use session::{EditSession, EditorState, NoticeTicket, TransientNotifier, WidgetEditor};
pub use store::{ConfigStore, MemoryStore};
pub use workbench::Workbench;

pub mod prelude {
    pub use super::{
        ConfigFactory, ConfigStore, ConstraintRegistry, EditSession, EngineError, FieldResolver,
        MemoryStore, SchemaIndex, WidgetConfig, WidgetEditor, Workbench,
    };
}
