// Module layout (Clean Architecture style)
// - bootstrap: configuration and application context
// - domain: stored names and the extension allow-list
// - application: storage port, upload use cases, per-path write locks
// - infrastructure: filesystem storage adapter
// - presentation: HTTP handlers and routing

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
