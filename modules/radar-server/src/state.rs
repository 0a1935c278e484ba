use radar_store::PgPool;

pub struct AppState {
    pub pool: PgPool,
}
