use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::{
    audit::log_audit,
    domain::status::ProductStatus,
    dto::products::{
        CreateProductRequest, ProductList, ProductWithCategories, SetCategoriesRequest,
        SetProductStatusRequest, UpdateProductRequest,
    },
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        feedback::{Column as FeedbackCol, Entity as Feedback},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        product_areas::{
            ActiveModel as ProductAreaActive, Column as ProductAreaCol, Entity as ProductAreas,
        },
        product_categories::{
            ActiveModel as ProductCategoryActive, Column as ProductCategoryCol,
            Entity as ProductCategories,
        },
        products::{
            ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Relation,
            Model as ProductModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{Actor, ensure_staff},
    models::{Category, Product},
    notify,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::farmer_service,
    state::AppState,
};

/// Take `qty` units out of a product's stock. The update is guarded so the
/// row can never go negative: with two buyers racing for the last unit, the
/// second one's UPDATE matches zero rows and fails here.
pub async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
    qty: i32,
) -> AppResult<()> {
    if qty <= 0 {
        return Err(AppError::Validation("Quantity must be positive".into()));
    }

    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(qty))
        .filter(ProdCol::Id.eq(product_id))
        .filter(ProdCol::Stock.gte(qty))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::InsufficientStock(format!(
            "Product {product_id} does not have {qty} in stock"
        )));
    }
    Ok(())
}

/// Put `qty` units back, the exact inverse of [`decrement_stock`].
pub async fn restore_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
    qty: i32,
) -> AppResult<()> {
    if qty <= 0 {
        return Err(AppError::Validation("Quantity must be positive".into()));
    }

    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(qty))
        .filter(ProdCol::Id.eq(product_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// New listing from a farmer. Starts `pending` until staff approve it; must
/// carry at least one category, and any production areas named must belong
/// to the listing farmer.
pub async fn create_product(
    state: &AppState,
    actor: &Actor,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    if payload.price <= 0 {
        return Err(AppError::Validation("Price must be positive".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::Validation("Stock cannot be negative".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if payload.unit_type.trim().is_empty() {
        return Err(AppError::Validation("unit_type is required".into()));
    }
    if payload.category_ids.is_empty() {
        return Err(AppError::Validation(
            "A product needs at least one category".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    farmer_service::ensure_farmer(&txn, actor.user_id).await?;
    ensure_categories_exist(&txn, &payload.category_ids).await?;
    if !payload.area_ids.is_empty() {
        farmer_service::ensure_owns_areas(&txn, actor.user_id, &payload.area_ids).await?;
    }

    let product = ProductActive {
        id: NotSet,
        farmer_id: Set(actor.user_id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        status: Set(ProductStatus::Pending.as_str().into()),
        unit_type: Set(payload.unit_type),
        image_url: Set(payload.image_url),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for category_id in dedup(&payload.category_ids) {
        ProductCategoryActive {
            product_id: Set(product.id),
            category_id: Set(category_id),
        }
        .insert(&txn)
        .await?;
    }
    for area_id in dedup(&payload.area_ids) {
        ProductAreaActive {
            product_id: Set(product.id),
            area_id: Set(area_id),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    actor: &Actor,
    id: i64,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    if let Some(price) = payload.price {
        if price <= 0 {
            return Err(AppError::Validation("Price must be positive".into()));
        }
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::Validation("Stock cannot be negative".into()));
        }
    }

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if actor.role != "staff" && existing.farmer_id != actor.user_id {
        return Err(AppError::Forbidden);
    }

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(unit_type) = payload.unit_type {
        active.unit_type = Set(unit_type);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Staff listing approval. Status changes are independent of any orders the
/// product appears in.
pub async fn set_status(
    state: &AppState,
    actor: &Actor,
    id: i64,
    payload: SetProductStatusRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(actor)?;
    let status: ProductStatus = payload.status.parse()?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let farmer_id = existing.farmer_id;
    let mut active: ProductActive = existing.into();
    active.status = Set(status.as_str().into());
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    notify::dispatch_quietly(
        &state.pool,
        farmer_id,
        &format!("Your listing '{}' is now {}", product.name, status),
        "product_status",
        Some(product.id),
    )
    .await;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "product_status_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id, "status": status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Status updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Replace the product's category set wholesale. A product can never end up
/// without a category.
pub async fn set_categories(
    state: &AppState,
    actor: &Actor,
    id: i64,
    payload: SetCategoriesRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if payload.category_ids.is_empty() {
        return Err(AppError::Validation(
            "A product needs at least one category".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if actor.role != "staff" && product.farmer_id != actor.user_id {
        return Err(AppError::Forbidden);
    }

    ensure_categories_exist(&txn, &payload.category_ids).await?;

    ProductCategories::delete_many()
        .filter(ProductCategoryCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    for category_id in dedup(&payload.category_ids) {
        ProductCategoryActive {
            product_id: Set(id),
            category_id: Set(category_id),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Categories updated",
        serde_json::json!({ "product_id": id, "categories": payload.category_ids }),
        Some(Meta::empty()),
    ))
}

/// Remove a listing. Order history and feedback keep their rows with the
/// product reference nullified; category and production-area mappings are
/// deleted outright. All of it happens in one transaction.
pub async fn delete_product(
    state: &AppState,
    actor: &Actor,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if actor.role != "staff" && product.farmer_id != actor.user_id {
        return Err(AppError::Forbidden);
    }

    OrderItems::update_many()
        .col_expr(OrderItemCol::ProductId, Expr::value(Option::<i64>::None))
        .filter(OrderItemCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    Feedback::update_many()
        .col_expr(FeedbackCol::ProductId, Expr::value(Option::<i64>::None))
        .filter(FeedbackCol::ProductId.eq(id))
        .exec(&txn)
        .await?;

    ProductCategories::delete_many()
        .filter(ProductCategoryCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    ProductAreas::delete_many()
        .filter(ProductAreaCol::ProductId.eq(id))
        .exec(&txn)
        .await?;

    Products::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(actor.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn get_product(
    state: &AppState,
    id: i64,
) -> AppResult<ApiResponse<ProductWithCategories>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let category_ids: Vec<i64> = ProductCategories::find()
        .filter(ProductCategoryCol::ProductId.eq(id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|mapping| mapping.category_id)
        .collect();

    let categories = Categories::find()
        .filter(CategoryCol::Id.is_in(category_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|category| Category {
            id: category.id,
            name: category.name,
        })
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductWithCategories {
            product: product_from_entity(product),
            categories,
        },
        None,
    ))
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Description).ilike(pattern)),
        );
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: ProductStatus = status.parse()?;
        condition = condition.add(ProdCol::Status.eq(status.as_str()));
    }
    if let Some(farmer_id) = query.farmer_id {
        condition = condition.add(ProdCol::FarmerId.eq(farmer_id));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Name => ProdCol::Name,
    };

    let mut finder = Products::find().filter(condition);
    if let Some(category_id) = query.category_id {
        finder = finder
            .join(JoinType::InnerJoin, Relation::ProductCategories.def())
            .filter(ProductCategoryCol::CategoryId.eq(category_id));
    }
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

async fn ensure_categories_exist<C: ConnectionTrait>(
    conn: &C,
    category_ids: &[i64],
) -> AppResult<()> {
    let ids = dedup(category_ids);
    let found = Categories::find()
        .filter(CategoryCol::Id.is_in(ids.clone()))
        .count(conn)
        .await?;
    if found as usize != ids.len() {
        return Err(AppError::Validation("Unknown category in set".into()));
    }
    Ok(())
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        farmer_id: model.farmer_id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        status: model.status,
        unit_type: model.unit_type,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
