//! Entity descriptors
//!
//! The set of tables is closed: every table the engine can touch is an
//! [`Entity`] variant with a static [`EntityDescriptor`] listing its
//! columns, their coercion class and its secondary indexes. Backends and
//! the codec work exclusively from these descriptors.

use crate::errors::{ExError, ExErrorKind};
use std::fmt;
use std::str::FromStr;

/// Columns stored as serialized JSON text and decoded back on read
pub const JSON_FIELDS: &[&str] = &["sheet_ids", "subscription", "tags", "social_programs", "data"];

/// Columns stored as INTEGER 0/1 and decoded back to booleans on read
pub const BOOL_FIELDS: &[&str] = &[
    "require_auth",
    "sync_enabled",
    "active",
    "whatsapp",
    "is_recurring",
    "notification_dismissed",
    "cancel_at_period_end",
];

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Real,
    Integer,
    /// Stored as INTEGER 0/1
    Boolean,
    /// Stored as serialized JSON text
    Json,
}

impl ColumnType {
    /// SQL type used in `CREATE TABLE`
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text | ColumnType::Json => "TEXT",
            ColumnType::Real => "REAL",
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
}

/// Secondary index declared on a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDef {
    /// Plain index over one column
    Column {
        name: &'static str,
        column: &'static str,
    },
    /// Computed index over the year (first four characters) of an ISO
    /// date column
    Year {
        name: &'static str,
        column: &'static str,
    },
}

impl IndexDef {
    pub fn name(&self) -> &'static str {
        match self {
            IndexDef::Column { name, .. } | IndexDef::Year { name, .. } => name,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            IndexDef::Column { column, .. } | IndexDef::Year { column, .. } => column,
        }
    }
}

/// Static description of one entity table
#[derive(Debug)]
pub struct EntityDescriptor {
    pub entity: Entity,
    pub table: &'static str,
    /// Ordered column list; the first column is always `id`
    pub columns: &'static [ColumnDef],
    pub indexes: &'static [IndexDef],
}

impl EntityDescriptor {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|c| c.name)
    }

    /// Columns of this table in the JSON allowlist
    pub fn json_columns(&self) -> Vec<&'static str> {
        self.columns_of(ColumnType::Json)
    }

    /// Columns of this table in the boolean allowlist
    pub fn bool_columns(&self) -> Vec<&'static str> {
        self.columns_of(ColumnType::Boolean)
    }

    fn columns_of(&self, ty: ColumnType) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.ty == ty)
            .map(|c| c.name)
            .collect()
    }
}

/// Every table known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    Products,
    Clients,
    Transactions,
    Sales,
    SaleItems,
    Expenses,
    Income,
    Insights,
    Persons,
    Donors,
    FinancialCategories,
    SystemUsers,
    InvitationCodes,
    SystemConfig,
    SubscriptionStatus,
    SyncMetadata,
    SyncData,
    RecurringExpenses,
}

impl Entity {
    /// All entities in schema creation order
    pub const ALL: [Entity; 18] = [
        Entity::Products,
        Entity::Clients,
        Entity::Transactions,
        Entity::Sales,
        Entity::SaleItems,
        Entity::Expenses,
        Entity::Income,
        Entity::Insights,
        Entity::Persons,
        Entity::Donors,
        Entity::FinancialCategories,
        Entity::SystemUsers,
        Entity::InvitationCodes,
        Entity::SystemConfig,
        Entity::SubscriptionStatus,
        Entity::SyncMetadata,
        Entity::SyncData,
        Entity::RecurringExpenses,
    ];

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        match self {
            Entity::Products => &PRODUCTS,
            Entity::Clients => &CLIENTS,
            Entity::Transactions => &TRANSACTIONS,
            Entity::Sales => &SALES,
            Entity::SaleItems => &SALE_ITEMS,
            Entity::Expenses => &EXPENSES,
            Entity::Income => &INCOME,
            Entity::Insights => &INSIGHTS,
            Entity::Persons => &PERSONS,
            Entity::Donors => &DONORS,
            Entity::FinancialCategories => &FINANCIAL_CATEGORIES,
            Entity::SystemUsers => &SYSTEM_USERS,
            Entity::InvitationCodes => &INVITATION_CODES,
            Entity::SystemConfig => &SYSTEM_CONFIG,
            Entity::SubscriptionStatus => &SUBSCRIPTION_STATUS,
            Entity::SyncMetadata => &SYNC_METADATA,
            Entity::SyncData => &SYNC_DATA,
            Entity::RecurringExpenses => &RECURRING_EXPENSES,
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.descriptor().table
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for Entity {
    type Err = ExError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entity::ALL
            .iter()
            .copied()
            .find(|e| e.table_name() == s)
            .ok_or_else(|| {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_op("parse_entity")
                    .with_message(format!("unknown table '{}'", s))
            })
    }
}

const fn text(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Text,
    }
}

const fn real(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Real,
    }
}

const fn integer(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Integer,
    }
}

const fn boolean(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Boolean,
    }
}

const fn json(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        ty: ColumnType::Json,
    }
}

const ID: ColumnDef = text("id");

static PRODUCTS: EntityDescriptor = EntityDescriptor {
    entity: Entity::Products,
    table: "products",
    columns: &[
        ID,
        text("name"),
        text("description"),
        text("sku"),
        real("price"),
        real("cost"),
        integer("stock"),
        text("unit"),
        text("category"),
        boolean("active"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_products_name",
        column: "name",
    }],
};

static CLIENTS: EntityDescriptor = EntityDescriptor {
    entity: Entity::Clients,
    table: "clients",
    columns: &[
        ID,
        text("name"),
        text("email"),
        text("phone"),
        text("document"),
        text("address"),
        text("birth_date"),
        boolean("whatsapp"),
        json("tags"),
        text("notes"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_clients_name",
        column: "name",
    }],
};

static TRANSACTIONS: EntityDescriptor = EntityDescriptor {
    entity: Entity::Transactions,
    table: "transactions",
    columns: &[
        ID,
        text("type"),
        text("description"),
        real("value"),
        text("date"),
        text("due_date"),
        text("status"),
        text("payment_method"),
        text("category_id"),
        text("client_id"),
        text("person_id"),
        text("sale_id"),
        boolean("is_recurring"),
        text("recurring_expense_id"),
        text("notes"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[
        IndexDef::Column {
            name: "idx_transactions_date",
            column: "date",
        },
        IndexDef::Column {
            name: "idx_transactions_status",
            column: "status",
        },
        IndexDef::Column {
            name: "idx_transactions_type",
            column: "type",
        },
        IndexDef::Year {
            name: "idx_transactions_year",
            column: "date",
        },
    ],
};

static SALES: EntityDescriptor = EntityDescriptor {
    entity: Entity::Sales,
    table: "sales",
    columns: &[
        ID,
        text("client_id"),
        text("date"),
        real("subtotal"),
        real("discount"),
        real("total"),
        text("payment_method"),
        text("status"),
        text("notes"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[
        IndexDef::Column {
            name: "idx_sales_date",
            column: "date",
        },
        IndexDef::Column {
            name: "idx_sales_client_id",
            column: "client_id",
        },
        IndexDef::Year {
            name: "idx_sales_year",
            column: "date",
        },
    ],
};

static SALE_ITEMS: EntityDescriptor = EntityDescriptor {
    entity: Entity::SaleItems,
    table: "saleItems",
    columns: &[
        ID,
        text("sale_id"),
        text("product_id"),
        text("product_name"),
        real("quantity"),
        real("unit_price"),
        real("total"),
    ],
    indexes: &[
        IndexDef::Column {
            name: "idx_sale_items_sale_id",
            column: "sale_id",
        },
        IndexDef::Column {
            name: "idx_sale_items_product_id",
            column: "product_id",
        },
    ],
};

static EXPENSES: EntityDescriptor = EntityDescriptor {
    entity: Entity::Expenses,
    table: "expenses",
    columns: &[
        ID,
        text("description"),
        real("value"),
        text("date"),
        text("category_id"),
        text("payment_method"),
        text("supplier"),
        boolean("is_recurring"),
        text("recurring_expense_id"),
        text("notes"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[
        IndexDef::Column {
            name: "idx_expenses_date",
            column: "date",
        },
        IndexDef::Year {
            name: "idx_expenses_year",
            column: "date",
        },
    ],
};

static INCOME: EntityDescriptor = EntityDescriptor {
    entity: Entity::Income,
    table: "income",
    columns: &[
        ID,
        text("description"),
        real("value"),
        text("date"),
        text("category_id"),
        text("source"),
        text("payment_method"),
        text("notes"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[
        IndexDef::Column {
            name: "idx_income_date",
            column: "date",
        },
        IndexDef::Year {
            name: "idx_income_year",
            column: "date",
        },
    ],
};

static INSIGHTS: EntityDescriptor = EntityDescriptor {
    entity: Entity::Insights,
    table: "insights",
    columns: &[
        ID,
        text("type"),
        text("title"),
        text("period"),
        json("data"),
        boolean("notification_dismissed"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_insights_type",
        column: "type",
    }],
};

static PERSONS: EntityDescriptor = EntityDescriptor {
    entity: Entity::Persons,
    table: "persons",
    columns: &[
        ID,
        text("name"),
        text("email"),
        text("phone"),
        text("document"),
        text("birth_date"),
        text("address"),
        text("role"),
        json("social_programs"),
        boolean("whatsapp"),
        text("notes"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_persons_name",
        column: "name",
    }],
};

static DONORS: EntityDescriptor = EntityDescriptor {
    entity: Entity::Donors,
    table: "donors",
    columns: &[
        ID,
        text("name"),
        text("email"),
        text("phone"),
        text("document"),
        text("donation_type"),
        real("amount"),
        text("frequency"),
        boolean("active"),
        boolean("whatsapp"),
        json("tags"),
        text("notes"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_donors_name",
        column: "name",
    }],
};

static FINANCIAL_CATEGORIES: EntityDescriptor = EntityDescriptor {
    entity: Entity::FinancialCategories,
    table: "financialCategories",
    columns: &[
        ID,
        text("name"),
        text("type"),
        text("color"),
        text("icon"),
        boolean("active"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_financial_categories_type",
        column: "type",
    }],
};

static SYSTEM_USERS: EntityDescriptor = EntityDescriptor {
    entity: Entity::SystemUsers,
    table: "systemUsers",
    columns: &[
        ID,
        text("name"),
        text("email"),
        text("password_hash"),
        text("role"),
        boolean("active"),
        text("last_login"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_system_users_email",
        column: "email",
    }],
};

static INVITATION_CODES: EntityDescriptor = EntityDescriptor {
    entity: Entity::InvitationCodes,
    table: "invitationCodes",
    columns: &[
        ID,
        text("code"),
        text("email"),
        text("role"),
        text("used_by"),
        text("used_at"),
        text("expires_at"),
        text("created_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_invitation_codes_code",
        column: "code",
    }],
};

static SYSTEM_CONFIG: EntityDescriptor = EntityDescriptor {
    entity: Entity::SystemConfig,
    table: "systemConfig",
    columns: &[
        ID,
        text("organization_name"),
        text("owner_name"),
        text("email"),
        text("phone"),
        text("document"),
        text("currency"),
        text("theme"),
        boolean("require_auth"),
        boolean("sync_enabled"),
        text("spreadsheet_id"),
        json("sheet_ids"),
        text("drive_folder_id"),
        text("last_backup_at"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[],
};

static SUBSCRIPTION_STATUS: EntityDescriptor = EntityDescriptor {
    entity: Entity::SubscriptionStatus,
    table: "subscriptionStatus",
    columns: &[
        ID,
        text("status"),
        text("plan"),
        text("customer_id"),
        json("subscription"),
        text("current_period_end"),
        boolean("cancel_at_period_end"),
        text("checked_at"),
        text("updated_at"),
    ],
    indexes: &[],
};

static SYNC_METADATA: EntityDescriptor = EntityDescriptor {
    entity: Entity::SyncMetadata,
    table: "syncMetadata",
    columns: &[
        ID,
        text("entity"),
        text("last_synced_at"),
        text("remote_revision"),
        text("status"),
        text("error"),
        text("updated_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_sync_metadata_entity",
        column: "entity",
    }],
};

static SYNC_DATA: EntityDescriptor = EntityDescriptor {
    entity: Entity::SyncData,
    table: "syncData",
    columns: &[ID, text("entity"), json("data"), text("updated_at")],
    indexes: &[IndexDef::Column {
        name: "idx_sync_data_entity",
        column: "entity",
    }],
};

static RECURRING_EXPENSES: EntityDescriptor = EntityDescriptor {
    entity: Entity::RecurringExpenses,
    table: "recurringExpenses",
    columns: &[
        ID,
        text("description"),
        real("value"),
        text("category_id"),
        text("frequency"),
        integer("day_of_month"),
        text("start_date"),
        text("end_date"),
        text("last_generated"),
        boolean("active"),
        text("notes"),
        text("created_at"),
        text("updated_at"),
    ],
    indexes: &[IndexDef::Column {
        name: "idx_recurring_expenses_active",
        column: "active",
    }],
};
