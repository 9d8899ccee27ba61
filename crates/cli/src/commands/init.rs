//! `usde init` - provision the full USDE schema
//!
//! One declarative plan replaces the old init-db scripts. The quoted
//! PascalCase Prisma names are the canonical schema; tables come first,
//! then the subsidiary columns on Company, then the indexes. Index names
//! are quoted in the DDL so they match their existence checks.

use tracing::info;
use usde_schema::{DatabaseConfig, MigrationPlan, MigrationSequencer, MigrationStep};

pub async fn run() -> anyhow::Result<()> {
    let config = DatabaseConfig::from_env()?;
    info!(database = %config.connection_info(), "provisioning USDE schema");

    let pool = config.connect().await?;
    let sequencer = MigrationSequencer::new(pool);
    let report = sequencer.run(&plan()).await?;

    println!(
        "✅ Schema provisioned: {} step(s) applied, {} already present",
        report.applied_count, report.skipped_count
    );
    Ok(())
}

pub fn plan() -> MigrationPlan {
    MigrationPlan::new("usde-init")
        .step(MigrationStep::create_table(
            "Company",
            r#"CREATE TABLE "Company" (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                type TEXT DEFAULT 'company',
                role TEXT DEFAULT 'enterprise_user',
                status TEXT DEFAULT 'active',
                "kycStatus" TEXT DEFAULT 'pending',
                balance DOUBLE PRECISION DEFAULT 0,
                "usdeBalance" DOUBLE PRECISION DEFAULT 0,
                "createdAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                "updatedAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "Enterprise",
            r#"CREATE TABLE "Enterprise" (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                "adminId" TEXT UNIQUE NOT NULL,
                "createdAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                "updatedAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                CONSTRAINT "Enterprise_adminId_fkey" FOREIGN KEY ("adminId") REFERENCES "Company"(id)
            )"#,
        ))
        .step(MigrationStep::create_table(
            "Role",
            r#"CREATE TABLE "Role" (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT,
                "createdAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                "updatedAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "Permission",
            r#"CREATE TABLE "Permission" (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT,
                "createdAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                "updatedAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "UserRole",
            r#"CREATE TABLE "UserRole" (
                id TEXT PRIMARY KEY,
                "userId" TEXT NOT NULL,
                "roleId" TEXT NOT NULL,
                "companyId" TEXT,
                "assignedAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "TreasurySettings",
            r#"CREATE TABLE "TreasurySettings" (
                id TEXT PRIMARY KEY,
                "companyId" TEXT UNIQUE NOT NULL,
                "monthlyBudget" DOUBLE PRECISION DEFAULT 0,
                "quarterlyBudget" DOUBLE PRECISION DEFAULT 0,
                "approvalThreshold" DOUBLE PRECISION DEFAULT 1000,
                "autoApprovalEnabled" BOOLEAN DEFAULT false,
                "riskFlagThreshold" DOUBLE PRECISION DEFAULT 5000,
                "approvalWorkflow" TEXT DEFAULT 'single',
                "createdAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                "updatedAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "Payment",
            r#"CREATE TABLE "Payment" (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                amount DOUBLE PRECISION NOT NULL,
                currency TEXT DEFAULT 'USD',
                status TEXT DEFAULT 'pending',
                type TEXT,
                description TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "PaymentRequest",
            r#"CREATE TABLE "PaymentRequest" (
                id TEXT PRIMARY KEY,
                "companyId" TEXT NOT NULL,
                type TEXT NOT NULL,
                "tokenAddress" TEXT NOT NULL,
                amount DOUBLE PRECISION NOT NULL,
                recipient TEXT,
                "targetCompanyId" TEXT,
                purpose TEXT NOT NULL,
                status TEXT DEFAULT 'pending',
                "requestedBy" TEXT NOT NULL,
                "requestedAt" TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                "approvedBy" TEXT,
                "approvedAt" TIMESTAMP,
                "rejectedBy" TEXT,
                "rejectedAt" TIMESTAMP,
                "rejectionReason" TEXT,
                CONSTRAINT "PaymentRequest_companyId_fkey" FOREIGN KEY ("companyId") REFERENCES "Company"(id),
                CONSTRAINT "PaymentRequest_targetCompanyId_fkey" FOREIGN KEY ("targetCompanyId") REFERENCES "Company"(id)
            )"#,
        ))
        .step(MigrationStep::create_table(
            "USDETransaction",
            r#"CREATE TABLE "USDETransaction" (
                id TEXT PRIMARY KEY,
                "companyId" TEXT NOT NULL,
                type TEXT NOT NULL,
                amount DOUBLE PRECISION NOT NULL,
                "balanceBefore" DOUBLE PRECISION NOT NULL,
                "balanceAfter" DOUBLE PRECISION NOT NULL,
                description TEXT,
                metadata TEXT,
                timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                CONSTRAINT "USDETransaction_companyId_fkey" FOREIGN KEY ("companyId") REFERENCES "Company"(id)
            )"#,
        ))
        .step(MigrationStep::create_table(
            "Stake",
            r#"CREATE TABLE "Stake" (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                amount DOUBLE PRECISION NOT NULL,
                apy DOUBLE PRECISION DEFAULT 0.05,
                status TEXT DEFAULT 'active',
                start_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                end_date TIMESTAMP,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "Deposit",
            r#"CREATE TABLE "Deposit" (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                amount DOUBLE PRECISION NOT NULL,
                currency TEXT DEFAULT 'USD',
                status TEXT DEFAULT 'pending',
                stripe_payment_intent_id TEXT,
                usde_minted DOUBLE PRECISION DEFAULT 0,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "Withdrawal",
            r#"CREATE TABLE "Withdrawal" (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                amount DOUBLE PRECISION NOT NULL,
                currency TEXT DEFAULT 'USD',
                status TEXT DEFAULT 'pending',
                bank_account_id TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "KYC",
            r#"CREATE TABLE "KYC" (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                status TEXT DEFAULT 'pending',
                documents TEXT,
                notes TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        .step(MigrationStep::create_table(
            "BankAccount",
            r#"CREATE TABLE "BankAccount" (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                account_number TEXT NOT NULL,
                routing_number TEXT NOT NULL,
                bank_name TEXT NOT NULL,
                account_type TEXT DEFAULT 'checking',
                status TEXT DEFAULT 'active',
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )"#,
        ))
        // Subsidiary support, added to databases provisioned before it existed
        .step(MigrationStep::add_column(
            "Company",
            "companyCode",
            r#"ALTER TABLE "Company" ADD COLUMN "companyCode" TEXT"#,
        ))
        .step(MigrationStep::add_column(
            "Company",
            "companyAddress",
            r#"ALTER TABLE "Company" ADD COLUMN "companyAddress" TEXT"#,
        ))
        .step(MigrationStep::add_column(
            "Company",
            "parentCompanyId",
            r#"ALTER TABLE "Company" ADD COLUMN "parentCompanyId" TEXT"#,
        ))
        .step(MigrationStep::add_column(
            "Company",
            "isParentCompany",
            r#"ALTER TABLE "Company" ADD COLUMN "isParentCompany" BOOLEAN DEFAULT false"#,
        ))
        .step(MigrationStep::add_column(
            "Company",
            "companyType",
            r#"ALTER TABLE "Company" ADD COLUMN "companyType" TEXT"#,
        ))
        .step(MigrationStep::create_index(
            "idx_company_parentCompanyId",
            r#"CREATE INDEX "idx_company_parentCompanyId" ON "Company"("parentCompanyId")"#,
        ))
        .step(MigrationStep::create_index(
            "idx_company_companyCode",
            r#"CREATE INDEX "idx_company_companyCode" ON "Company"("companyCode")"#,
        ))
        .step(MigrationStep::create_index(
            "idx_company_companyType",
            r#"CREATE INDEX "idx_company_companyType" ON "Company"("companyType")"#,
        ))
        .step(MigrationStep::create_index(
            "idx_paymentrequest_companyId",
            r#"CREATE INDEX "idx_paymentrequest_companyId" ON "PaymentRequest"("companyId")"#,
        ))
        .step(MigrationStep::create_index(
            "idx_paymentrequest_status",
            r#"CREATE INDEX "idx_paymentrequest_status" ON "PaymentRequest"(status)"#,
        ))
        .step(MigrationStep::create_index(
            "idx_paymentrequest_type",
            r#"CREATE INDEX "idx_paymentrequest_type" ON "PaymentRequest"(type)"#,
        ))
        .step(MigrationStep::create_index(
            "idx_paymentrequest_targetCompanyId",
            r#"CREATE INDEX "idx_paymentrequest_targetCompanyId" ON "PaymentRequest"("targetCompanyId")"#,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use usde_schema::ExistenceCheck;

    #[test]
    fn company_is_created_before_its_dependents() {
        let plan = plan();
        let position = |name: &str| {
            plan.steps
                .iter()
                .position(|s| s.name == name)
                .unwrap_or_else(|| panic!("missing step '{name}'"))
        };

        let company = position("create table Company");
        assert!(company < position("create table Enterprise"));
        assert!(company < position("create table PaymentRequest"));
        assert!(company < position("add column Company.parentCompanyId"));
        assert!(
            position("create table PaymentRequest")
                < position("create index idx_paymentrequest_status")
        );
        assert!(
            position("add column Company.companyCode")
                < position("create index idx_company_companyCode")
        );
    }

    #[test]
    fn every_step_carries_an_existence_guard() {
        for step in plan().steps {
            assert_ne!(
                step.check,
                ExistenceCheck::Always,
                "step '{}' has no guard",
                step.name
            );
            assert!(!step.statements.is_empty());
        }
    }

    #[test]
    fn provisions_the_full_table_set() {
        let plan = plan();
        let tables: Vec<&str> = plan
            .steps
            .iter()
            .filter_map(|s| match &s.check {
                ExistenceCheck::Table(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(tables.len(), 14);
        assert!(tables.contains(&"Company"));
        assert!(tables.contains(&"BankAccount"));
    }
}
