//! `usde status` - report which expected schema objects exist
//!
//! A report, not a check: missing objects are listed but the command still
//! exits 0. Only inspection failures are errors.

use tracing::info;
use usde_schema::{DatabaseConfig, PostgresInspector, SchemaInspector};

const EXPECTED_TABLES: &[&str] = &[
    "Company",
    "Enterprise",
    "Role",
    "Permission",
    "UserRole",
    "TreasurySettings",
    "Payment",
    "PaymentRequest",
    "USDETransaction",
    "Stake",
    "Deposit",
    "Withdrawal",
    "KYC",
    "BankAccount",
];

const EXPECTED_COMPANY_COLUMNS: &[&str] = &[
    "companyCode",
    "companyAddress",
    "parentCompanyId",
    "isParentCompany",
    "companyType",
];

const EXPECTED_INDEXES: &[&str] = &[
    "idx_company_parentCompanyId",
    "idx_company_companyCode",
    "idx_company_companyType",
    "idx_paymentrequest_companyId",
    "idx_paymentrequest_status",
    "idx_paymentrequest_type",
    "idx_paymentrequest_targetCompanyId",
];

pub async fn run() -> anyhow::Result<()> {
    let config = DatabaseConfig::from_env()?;
    info!(database = %config.connection_info(), "inspecting schema state");

    let pool = config.connect().await?;
    let mut conn = pool.acquire().await?;
    let inspector = PostgresInspector::new();

    let mut missing = 0usize;

    println!("Tables:");
    for table in EXPECTED_TABLES {
        let present = inspector.has_table(&mut conn, table).await?;
        missing += usize::from(!present);
        println!("  {} {}", mark(present), table);
    }

    println!("\nCompany subsidiary columns:");
    for column in EXPECTED_COMPANY_COLUMNS {
        let present = inspector.has_column(&mut conn, "Company", column).await?;
        missing += usize::from(!present);
        println!("  {} Company.{}", mark(present), column);
    }

    println!("\nIndexes:");
    for index in EXPECTED_INDEXES {
        let present = inspector.has_index(&mut conn, index).await?;
        missing += usize::from(!present);
        println!("  {} {}", mark(present), index);
    }

    if missing == 0 {
        println!("\n✅ All expected schema objects are present");
    } else {
        println!("\n⚠️  {missing} expected object(s) missing - run `usde init`");
    }

    Ok(())
}

fn mark(present: bool) -> &'static str {
    if present {
        "✅"
    } else {
        "❌"
    }
}
