use crate::backend::{Backend, QueryResult};
use crate::error::ReportError;
use crate::model::QueryParams;

pub const LOOKUP_TABLE: &str = "product_orders";

/// The only statement this service runs against `product_orders`. The three
/// filter values are always bound as positional parameters.
pub const LOOKUP_SQL: &str =
    "SELECT * FROM product_orders WHERE location = ? AND gf_number = ? AND order_id = ?";

/// Run the lookup for `params` through `backend`.
pub async fn run<B: Backend>(
    backend: &B,
    params: &QueryParams,
) -> Result<QueryResult, ReportError> {
    backend.query(LOOKUP_SQL, &params.as_bind_values()).await
}
