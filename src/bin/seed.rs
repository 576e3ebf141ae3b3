use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use harvest_market_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        drivers::{ActiveModel as DriverActive, Entity as Drivers},
        product_categories::ActiveModel as ProductCategoryActive,
        products::ActiveModel as ProductActive,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
};

/// Development seed: one user per role, a couple of categories, and an
/// approved listing so the checkout flow works out of the box.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let mut user_ids = Vec::new();
    for (name, email, role) in [
        ("Market Staff", "staff@harvest.local", "staff"),
        ("Aling Nena", "nena@harvest.local", "farmer"),
        ("Juan Consumer", "juan@harvest.local", "consumer"),
        ("Pedro Driver", "pedro@harvest.local", "driver"),
    ] {
        let existing = Users::find()
            .filter(UserCol::Email.eq(email))
            .one(&orm)
            .await?;
        let id = match existing {
            Some(user) => user.id,
            None => {
                UserActive {
                    id: NotSet,
                    name: Set(name.to_string()),
                    email: Set(email.to_string()),
                    role: Set(role.to_string()),
                    created_at: NotSet,
                }
                .insert(&orm)
                .await?
                .id
            }
        };
        user_ids.push(id);
    }
    let farmer_id = user_ids[1];
    let driver_user_id = user_ids[3];

    let mut category_ids = Vec::new();
    for name in ["Vegetables", "Fruits"] {
        let existing = Categories::find()
            .filter(CategoryCol::Name.eq(name))
            .one(&orm)
            .await?;
        let id = match existing {
            Some(category) => category.id,
            None => {
                CategoryActive {
                    id: NotSet,
                    name: Set(name.to_string()),
                    created_at: NotSet,
                }
                .insert(&orm)
                .await?
                .id
            }
        };
        category_ids.push(id);
    }

    let product = ProductActive {
        id: NotSet,
        farmer_id: Set(farmer_id),
        name: Set("Native Tomatoes".to_string()),
        description: Set(Some("Freshly harvested".to_string())),
        price: Set(6_000),
        stock: Set(50),
        status: Set("approved".to_string()),
        unit_type: Set("kg".to_string()),
        image_url: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&orm)
    .await?;

    ProductCategoryActive {
        product_id: Set(product.id),
        category_id: Set(category_ids[0]),
    }
    .insert(&orm)
    .await?;

    if Drivers::find_by_id(driver_user_id).one(&orm).await?.is_none() {
        DriverActive {
            user_id: Set(driver_user_id),
            availability_status: Set("available".to_string()),
            vehicle_type: Set("tricycle".to_string()),
            max_load_capacity: Set(120),
            current_location: Set(Some("Public Market".to_string())),
            completed_pickups: Set(0),
            rating: Set(0.0),
            updated_at: NotSet,
        }
        .insert(&orm)
        .await?;
    }

    println!("Seed data inserted");
    Ok(())
}
