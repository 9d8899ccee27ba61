//! `usde seed` - base roles and demo accounts
//!
//! Everything here is an upsert keyed on a unique column, so reruns
//! refresh the demo data instead of duplicating it. Demo passwords come
//! from the environment with the documented demo defaults.

use tracing::info;
use usde_schema::{DatabaseConfig, MigrationSequencer, SeedRecord, SeedValue};
use uuid::Uuid;

const ADMIN_ID: &str = "admin-company-id";
const DEMO_ID: &str = "demo-company-id";
const SUBSIDIARY_ID: &str = "subsidiary-company-id";

pub async fn run() -> anyhow::Result<()> {
    let config = DatabaseConfig::from_env()?;
    info!(database = %config.connection_info(), "seeding demo data");

    let pool = config.connect().await?;
    let sequencer = MigrationSequencer::new(pool.clone());

    for record in role_records() {
        sequencer.seed(&record).await?;
    }
    println!("✅ Base roles seeded");

    for record in company_records()? {
        let id = sequencer.seed(&record).await?;
        info!(table = record.table(), id = %id, "company seeded");
    }
    println!("✅ Demo companies seeded");

    sequencer.seed(&enterprise_record()).await?;
    sequencer.seed(&treasury_record()).await?;
    println!("✅ Demo enterprise and treasury settings seeded");

    // Mirror of the old scripts' verification query
    let users: Vec<(String, String, String, String)> = sqlx::query_as(
        r#"SELECT email, name, type, "kycStatus" FROM "Company"
           WHERE email IN ('admin@usde.com', 'demo@usde.com', 'subsidiary@usde.com')
           ORDER BY email"#,
    )
    .fetch_all(&pool)
    .await?;

    println!("\nSeeded accounts:");
    for (email, name, kind, kyc) in users {
        println!("  - {email}: {name} ({kind}) - KYC: {kyc}");
    }

    Ok(())
}

fn role_records() -> Vec<SeedRecord> {
    [
        ("role_admin", "ADMIN", "Administrator with full access"),
        ("role_enterprise_admin", "ENTERPRISE_ADMIN", "Enterprise administrator"),
        ("role_enterprise_user", "ENTERPRISE_USER", "Enterprise user"),
        ("role_supervisor", "SUPERVISOR", "Supervisor with approval access"),
        ("role_operator", "OPERATOR", "Operator with basic access"),
        ("role_observer", "OBSERVER", "Observer with read-only access"),
    ]
    .into_iter()
    .map(|(id, name, description)| {
        SeedRecord::new("Role", &["id"])
            .column("id", id)
            .column("name", name)
            .column("description", description)
            .insert_only("createdAt", SeedValue::Now)
            .column("updatedAt", SeedValue::Now)
    })
    .collect()
}

fn company_records() -> anyhow::Result<Vec<SeedRecord>> {
    let admin_password = env_password("USDE_ADMIN_PASSWORD", "admin123")?;
    let demo_password = env_password("USDE_DEMO_PASSWORD", "demo123")?;

    let admin = company_record(ADMIN_ID, "System Administrator", "admin@usde.com")
        .column("password", admin_password)
        .column("type", "enterprise")
        .column("role", "admin")
        .column("balance", 0.0)
        .column("usdeBalance", 0.0);

    let demo = company_record(DEMO_ID, "Demo Company", "demo@usde.com")
        .column("password", demo_password.clone())
        .column("type", "enterprise")
        .column("role", "enterprise_admin")
        .column("balance", 5000.0)
        .column("usdeBalance", 10000.0)
        .column("isParentCompany", true);

    let subsidiary = company_record(SUBSIDIARY_ID, "Demo Subsidiary", "subsidiary@usde.com")
        .column("password", demo_password)
        .column("type", "subsidiary")
        .column("role", "enterprise_user")
        .column("balance", 2500.0)
        .column("usdeBalance", 5000.0)
        .column("parentCompanyId", DEMO_ID)
        .column("companyType", "subsidiary");

    Ok(vec![admin, demo, subsidiary])
}

fn company_record(id: &str, name: &str, email: &str) -> SeedRecord {
    SeedRecord::new("Company", &["email"])
        .insert_only("id", id)
        .column("name", name)
        .column("email", email)
        .column("status", "active")
        .column("kycStatus", "approved")
        .insert_only("createdAt", SeedValue::Now)
        .column("updatedAt", SeedValue::Now)
}

fn enterprise_record() -> SeedRecord {
    SeedRecord::new("Enterprise", &["adminId"])
        .insert_only("id", Uuid::new_v4().to_string())
        .column("name", "Demo Enterprise")
        .column("adminId", DEMO_ID)
        .insert_only("createdAt", SeedValue::Now)
        .column("updatedAt", SeedValue::Now)
}

fn treasury_record() -> SeedRecord {
    SeedRecord::new("TreasurySettings", &["companyId"])
        .insert_only("id", Uuid::new_v4().to_string())
        .column("companyId", DEMO_ID)
        .column("monthlyBudget", 1_000_000.0)
        .column("quarterlyBudget", 3_000_000.0)
        .column("approvalThreshold", 10_000.0)
        .column("autoApprovalEnabled", true)
        .column("riskFlagThreshold", 50_000.0)
        .column("approvalWorkflow", "single")
        .column("updatedAt", SeedValue::Now)
}

fn env_password(var: &str, default: &str) -> anyhow::Result<String> {
    let plain = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Ok(bcrypt::hash(plain, bcrypt::DEFAULT_COST)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_the_six_base_roles() {
        let records = role_records();
        assert_eq!(records.len(), 6);
        for record in &records {
            assert_eq!(record.table(), "Role");
            assert!(record.build_sql().is_ok());
        }
    }

    #[test]
    fn company_records_build_valid_upserts() {
        for record in company_records().expect("records") {
            let sql = record.build_sql().expect("valid record");
            assert!(sql.contains("ON CONFLICT (\"email\") DO UPDATE SET"));
            // Identity and creation time never change on rerun
            assert!(!sql.contains("\"id\" = EXCLUDED"));
            assert!(!sql.contains("\"createdAt\" = EXCLUDED"));
        }
    }

    #[test]
    fn satellite_records_key_on_their_unique_columns() {
        let sql = enterprise_record().build_sql().expect("enterprise");
        assert!(sql.contains("ON CONFLICT (\"adminId\")"));

        let sql = treasury_record().build_sql().expect("treasury");
        assert!(sql.contains("ON CONFLICT (\"companyId\")"));
    }
}
