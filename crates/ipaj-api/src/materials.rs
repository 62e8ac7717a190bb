use axum::{Json, extract::Query};

use ipaj_types::api::{MaterialResponse, MaterialsQuery};
use ipaj_types::catalog::{self, CATEGORIES};

/// GET /api/materiais?categoria=&q=
pub async fn list_materials(Query(query): Query<MaterialsQuery>) -> Json<Vec<MaterialResponse>> {
    let found = catalog::filter(query.categoria.as_deref(), query.q.as_deref());
    Json(found.into_iter().map(MaterialResponse::from).collect())
}

/// GET /api/materiais/categorias
pub async fn list_categories() -> Json<&'static [&'static str]> {
    Json(&CATEGORIES[..])
}
