#![allow(dead_code)]

use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use harvest_market_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        categories::ActiveModel as CategoryActive, drivers::ActiveModel as DriverActive,
        product_categories::ActiveModel as ProductCategoryActive,
        products::ActiveModel as ProductActive, users::ActiveModel as UserActive,
    },
    middleware::auth::Actor,
    state::AppState,
};

/// Connect to the test database, or None when no DB is configured so the
/// test can skip instead of failing on CI boxes without Postgres.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    Ok(Some(AppState { pool, orm }))
}

/// Tests run in parallel against one database, so every test creates its own
/// rows and never truncates; emails get a uuid to stay unique.
pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<i64> {
    let user = UserActive {
        id: NotSet,
        name: Set(format!("Test {role}")),
        email: Set(format!("{role}-{}@test.local", Uuid::new_v4())),
        role: Set(role.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

pub async fn create_category(state: &AppState) -> anyhow::Result<i64> {
    let category = CategoryActive {
        id: NotSet,
        name: Set(format!("Category {}", Uuid::new_v4())),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn create_approved_product(
    state: &AppState,
    farmer_id: i64,
    price: i64,
    stock: i32,
) -> anyhow::Result<i64> {
    let category_id = create_category(state).await?;
    let product = ProductActive {
        id: NotSet,
        farmer_id: Set(farmer_id),
        name: Set("Test Produce".to_string()),
        description: Set(None),
        price: Set(price),
        stock: Set(stock),
        status: Set("approved".to_string()),
        unit_type: Set("kg".to_string()),
        image_url: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    ProductCategoryActive {
        product_id: Set(product.id),
        category_id: Set(category_id),
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

pub async fn create_driver(state: &AppState, availability: &str) -> anyhow::Result<i64> {
    let user_id = create_user(state, "driver").await?;
    DriverActive {
        user_id: Set(user_id),
        availability_status: Set(availability.to_string()),
        vehicle_type: Set("tricycle".to_string()),
        max_load_capacity: Set(100),
        current_location: Set(None),
        completed_pickups: Set(0),
        rating: Set(0.0),
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user_id)
}

pub fn actor(user_id: i64, role: &str) -> Actor {
    Actor {
        user_id,
        role: role.to_string(),
    }
}
