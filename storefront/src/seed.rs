//! 示例数据 - 重置数据库并写入演示账号、分类与商品
//!
//! Everything goes through the regular repositories, so seeded rows obey the
//! same validation and hashing as live ones.

use std::collections::HashMap;

use serde::Serialize;
use shared::models::{CategoryCreate, ProductCreate, UserCreate, UserRole};

use crate::core::AppState;
use crate::db::repository::{RepoError, category, product, user};
use crate::utils::AppResult;

/// (username, password, email, full_name, phone, address, role)
pub const DEMO_USERS: &[(&str, &str, &str, &str, &str, &str, UserRole)] = &[
    ("admin", "admin123", "admin@musicstore.com", "Quản trị viên", "0901234567", "Hà Nội, Việt Nam", UserRole::Admin),
    ("customer", "customer123", "customer@example.com", "Nguyễn Văn A", "0912345678", "Đà Nẵng, Việt Nam", UserRole::Customer),
    ("user1", "123456", "user1@example.com", "Trần Thị B", "0923456789", "TP.HCM, Việt Nam", UserRole::Customer),
    ("user2", "123456", "user2@example.com", "Lê Văn C", "0934567890", "Hải Phòng, Việt Nam", UserRole::Customer),
];

/// (name, description, icon)
pub const DEMO_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Guitar", "Acoustic & Electric Guitars", "🎸"),
    ("Piano", "Acoustic & Digital Pianos", "🎹"),
    ("Drums", "Drum Sets & Percussion", "🥁"),
    ("Wind", "Saxophone, Trumpet, Flute", "🎺"),
    ("Violin", "Violin & String Instruments", "🎻"),
    ("Accessories", "Cables, Stands, Cases", "🎼"),
];

/// (category, name, brand, price, stock, discount_percent, description)
pub const DEMO_PRODUCTS: &[(&str, &str, &str, f64, i64, f64, &str)] = &[
    // Guitar
    ("Guitar", "Yamaha F310 Acoustic Guitar", "Yamaha", 3_500_000.0, 15, 10.0, "Guitar acoustic dành cho người mới bắt đầu, âm thanh ấm áp"),
    ("Guitar", "Fender Stratocaster Electric Guitar", "Fender", 12_000_000.0, 8, 5.0, "Guitar điện huyền thoại với âm thanh đa dạng"),
    ("Guitar", "Gibson Les Paul Standard", "Gibson", 35_000_000.0, 3, 0.0, "Guitar điện cao cấp với âm thanh rock đậm đà"),
    ("Guitar", "Ibanez RG Series Electric", "Ibanez", 8_500_000.0, 10, 8.0, "Guitar điện phù hợp cho rock và metal"),
    ("Guitar", "Taylor 214ce Acoustic", "Taylor", 18_000_000.0, 5, 0.0, "Guitar acoustic cao cấp với electronics tích hợp"),
    // Piano
    ("Piano", "Yamaha P-45 Digital Piano", "Yamaha", 11_000_000.0, 5, 12.0, "Đàn piano điện nhỏ gọn, phù hợp cho gia đình"),
    ("Piano", "Roland FP-30X Digital Piano", "Roland", 15_500_000.0, 7, 7.0, "Piano điện với âm thanh SuperNATURAL chân thực"),
    ("Piano", "Casio CT-S300 Keyboard", "Casio", 4_200_000.0, 12, 15.0, "Keyboard nhỏ gọn với 400 tones và 77 rhythms"),
    ("Piano", "Kawai ES110 Digital Piano", "Kawai", 14_000_000.0, 4, 0.0, "Piano điện cao cấp với Responsive Hammer Compact action"),
    // Drums
    ("Drums", "Pearl Export Drum Set", "Pearl", 18_000_000.0, 2, 10.0, "Bộ trống acoustic 5 piece hoàn chỉnh"),
    ("Drums", "Roland TD-17KVX Electronic Drums", "Roland", 32_000_000.0, 3, 5.0, "Bộ trống điện tử với âm thanh chuyên nghiệp"),
    ("Drums", "Tama Imperialstar Drum Set", "Tama", 15_000_000.0, 4, 8.0, "Bộ trống acoustic chất lượng cao cho người mới"),
    // Wind
    ("Wind", "Yamaha YAS-280 Alto Saxophone", "Yamaha", 25_000_000.0, 4, 0.0, "Saxophone alto chuyên nghiệp cho học sinh"),
    ("Wind", "Bach TR300H2 Trumpet", "Bach", 8_500_000.0, 6, 10.0, "Kèn trumpet phù hợp cho người mới bắt đầu"),
    ("Wind", "Yamaha YFL-222 Flute", "Yamaha", 12_000_000.0, 5, 5.0, "Sáo flute bạc với chất lượng âm thanh tuyệt vời"),
    // Violin
    ("Violin", "Stentor Student I Violin", "Stentor", 3_500_000.0, 8, 12.0, "Violin dành cho học sinh, bao gồm bow và case"),
    ("Violin", "Yamaha V3 Series Violin", "Yamaha", 7_500_000.0, 6, 0.0, "Violin chuyên nghiệp với âm thanh ấm áp"),
    // Accessories
    ("Accessories", "Guitar Stand Universal", "On-Stage", 250_000.0, 25, 0.0, "Giá đỡ guitar phù hợp mọi loại guitar"),
    ("Accessories", "Instrument Cable 3m", "Monster", 450_000.0, 30, 5.0, "Dây tín hiệu chất lượng cao cho nhạc cụ"),
    ("Accessories", "Guitar Strings Set", "D'Addario", 180_000.0, 50, 10.0, "Bộ dây guitar acoustic chất lượng cao"),
];

/// What a seeding run created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users: usize,
    pub categories: usize,
    pub products: usize,
    /// Non-fatal problems (duplicate demo users)
    pub warnings: Vec<String>,
}

/// Wipe the database and load the demo data set
pub async fn seed_all(state: &AppState) -> AppResult<SeedReport> {
    state.db.reset().await?;
    let pool = state.pool();
    let mut report = SeedReport::default();

    for &(username, password, email, full_name, phone, address, role) in DEMO_USERS {
        let data = UserCreate {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            phone: Some(phone.to_string()),
            address: Some(address.to_string()),
            role,
        };
        match user::register(pool, data).await {
            Ok(_) => report.users += 1,
            Err(RepoError::Duplicate(msg)) => {
                tracing::warn!(username, error = %msg, "Demo user already exists, skipped");
                report.warnings.push(msg);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut category_ids = HashMap::with_capacity(DEMO_CATEGORIES.len());
    for &(name, description, icon) in DEMO_CATEGORIES {
        let created = category::create(
            pool,
            CategoryCreate {
                name: name.to_string(),
                description: Some(description.to_string()),
                icon: Some(icon.to_string()),
            },
        )
        .await?;
        category_ids.insert(name, created.id);
        report.categories += 1;
    }

    for &(category_name, name, brand, price, stock, discount_percent, description) in DEMO_PRODUCTS {
        let Some(&category_id) = category_ids.get(category_name) else {
            report
                .warnings
                .push(format!("unknown category '{category_name}' for '{name}'"));
            continue;
        };
        product::create(
            pool,
            ProductCreate {
                category_id,
                name: name.to_string(),
                brand: brand.to_string(),
                price,
                stock,
                image: None,
                description: Some(description.to_string()),
                specifications: None,
                discount_percent: Some(discount_percent),
            },
        )
        .await?;
        report.products += 1;
    }

    tracing::info!(
        users = report.users,
        categories = report.categories,
        products = report.products,
        warnings = report.warnings.len(),
        "Database seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authenticate;
    use crate::core::{Config, DatabaseConfig};
    use crate::db::DbService;

    async fn test_state() -> AppState {
        let db = DbService::in_memory().await.unwrap();
        AppState::with_db(Config::with_database(DatabaseConfig::in_memory()), db)
    }

    #[tokio::test]
    async fn test_seed_all_loads_demo_data() {
        let state = test_state().await;
        let report = seed_all(&state).await.unwrap();

        assert_eq!(report.users, 4);
        assert_eq!(report.categories, 6);
        assert_eq!(report.products, DEMO_PRODUCTS.len());
        assert!(report.warnings.is_empty());

        let admin = authenticate(state.pool(), "admin", "admin123").await.unwrap();
        assert!(admin.is_admin());
        let guitars = product::search(state.pool(), "guitar").await.unwrap();
        assert!(!guitars.is_empty());
    }

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let state = test_state().await;
        seed_all(&state).await.unwrap();
        let again = seed_all(&state).await.unwrap();
        assert_eq!(again.users, 4);

        let counts = state.db.table_counts().await.unwrap();
        let users = counts.iter().find(|(t, _)| *t == "users").unwrap().1;
        assert_eq!(users, 4);
    }
}
