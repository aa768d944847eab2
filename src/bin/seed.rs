use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use boutique_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_admin(&pool, "admin@example.com", "admin123").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    ensure_user_with_role(pool, email, password, "admin").await
}

async fn ensure_user(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    ensure_user_with_role(pool, email, password, "user").await
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    // DO UPDATE guarantees the upsert always returns the row.
    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let categories = vec![
        ("Clothing", "Shirts, dresses and everyday wear"),
        ("Accessories", "Bags, jewellery and small goods"),
        ("Cosmetics", "Creams, oils and beauty products"),
    ];

    let mut category_ids = Vec::new();
    for (name, desc) in categories {
        let id = ensure_category(pool, name, desc).await?;
        category_ids.push(id);
    }

    // (name, description, price, promo_price, stock, category index)
    let products: Vec<(&str, &str, i64, Option<i64>, i32, usize)> = vec![
        ("Wax Print Shirt", "Hand-finished shirt in wax print fabric", 15000, Some(12000), 40, 0),
        ("Summer Dress", "Light dress for warm days", 18000, None, 25, 0),
        ("Leather Handbag", "Full-grain leather, brass fittings", 35000, Some(29000), 12, 1),
        ("Beaded Bracelet", "Hand-strung glass beads", 4000, None, 80, 1),
        ("Shea Body Butter", "Unrefined shea, 200ml jar", 6500, Some(5000), 60, 2),
        ("Coconut Hair Oil", "Cold-pressed, 100ml bottle", 5500, None, 45, 2),
    ];

    for (name, desc, price, promo, stock, cat_idx) in products {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, promo_price, stock, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(desc)
        .bind(price)
        .bind(promo)
        .bind(stock)
        .bind(category_ids[cat_idx])
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str, desc: &str) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(desc)
        .execute(pool)
        .await?;
    Ok(id)
}
