//! Flutter bridge surface for the folio editor core.

pub mod api;
