//! Demo listings so a fresh install has something to browse.

use anyhow::Context;
use tracing::info;

use crate::{
    auth::password::hash_password,
    schema::{NewJob, NewProduct, NewServiceRequest},
    storage::MarketStore,
};

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "Password1";

/// Creates the demo user and its listings unless a `demo` user already exists.
/// Returns whether anything was written.
pub async fn seed_demo(store: &dyn MarketStore) -> anyhow::Result<bool> {
    if store.get_user_by_username(DEMO_USERNAME).await?.is_some() {
        return Ok(false);
    }

    let hash = hash_password(DEMO_PASSWORD)?;
    let user = store
        .create_user(DEMO_USERNAME, &hash)
        .await
        .context("create demo user")?;

    let products = [
        NewProduct {
            title: "MacBook Pro 2021".into(),
            description: "M1 Pro, 16GB RAM, 512GB SSD. Great condition.".into(),
            price: 15000,
            image: "https://placehold.co/600x400/007AFF/ffffff?text=MacBook".into(),
            whatsapp: "27123456789".into(),
        },
        NewProduct {
            title: "Leather Sofa".into(),
            description: "3-seater black leather sofa. Pick up only.".into(),
            price: 3500,
            image: "https://placehold.co/600x400/007AFF/ffffff?text=Sofa".into(),
            whatsapp: "27123456789".into(),
        },
    ];
    for p in products {
        store.create_product(p, user.id).await?;
    }

    let jobs = [
        NewJob {
            title: "Gardener Needed".into(),
            description: "Need someone to clean my garden once a week.".into(),
            salary: "R300/day".into(),
            whatsapp: "27987654321".into(),
        },
        NewJob {
            title: "React Developer".into(),
            description: "Looking for a freelance React developer for a small project.".into(),
            salary: "R500/hr".into(),
            whatsapp: "27987654321".into(),
        },
    ];
    for j in jobs {
        store.create_job(j, user.id).await?;
    }

    store
        .create_request(
            NewServiceRequest {
                title: "Plumber Needed".into(),
                description: "Leaking tap in kitchen. Urgent.".into(),
                budget: Some("R500".into()),
            },
            user.id,
        )
        .await?;

    info!(user_id = user.id, "demo data seeded");
    Ok(true)
}
