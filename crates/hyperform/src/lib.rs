//! hyperform: HAL + HAL-FORMS client runtime.
//!
//! Lets a frontend render and operate a hypermedia API without per-resource
//! code: discover operations from links and templates, infer a display
//! schema from raw JSON, classify templates into navigation / form / action,
//! execute them with the right wire semantics, and validate input before it
//! leaves the client.

pub mod categorize;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod inference;
pub mod links;
pub mod resource;
pub mod transport;
pub mod validation;

pub use categorize::{
    categorize_template, categorize_templates, confirmation_message, template_defaults, visible_properties,
    CategorizedTemplate, TemplateCategory,
};
pub use client::{
    prepare_template_request, template_target, HypermediaClient, Outcome, PreparedRequest, Submission,
};
pub use collection::{
    collection_view, extract_embedded_items, get_pagination_info, CollectionView, PaginationInfo,
};
pub use config::{ClientConfig, Credentials};
pub use error::{ClientError, ClientResult};
pub use inference::{
    humanize_label, infer_columns, infer_field_type, is_sortable, ColumnOrdering, FieldConventions, FieldType,
    InferenceOptions, InferredField, PartialConventions,
};
pub use links::{
    available_relations, expand_template, find_link, find_links, get_href, has_capability, page_links, PageLinks,
    TemplateParams,
};
pub use resource::{Embedded, Link, PropertyOption, Relation, Resource, Template, TemplateProperty};
pub use transport::{CancelToken, NoopHooks, RequestBody, RequestOptions, Transport, TransportEvent, TransportHooks};
pub use validation::{validate_template_data, ValidationError};
