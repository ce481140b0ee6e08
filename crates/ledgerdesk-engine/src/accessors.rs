//! Per-entity accessors
//!
//! `list_<entity>` / `get_<entity>_by_id` / `upsert_<entity>` /
//! `delete_<entity>` for every table, all delegating to the generic
//! operations on [`Database`].

use crate::database::Database;
use ledgerdesk_core::errors::Result;
use ledgerdesk_core::model::{Entity, Record};

macro_rules! entity_accessors {
    ($($entity:ident => $list:ident, $get:ident, $upsert:ident, $delete:ident;)*) => {
        impl Database {
            $(
                pub fn $list(&self) -> Result<Vec<Record>> {
                    self.list(Entity::$entity)
                }

                pub fn $get(&self, id: &str) -> Result<Option<Record>> {
                    self.get_by_id(Entity::$entity, id)
                }

                pub fn $upsert(&mut self, record: &Record) -> Result<()> {
                    self.upsert(Entity::$entity, record)
                }

                pub fn $delete(&mut self, id: &str) -> Result<()> {
                    self.delete(Entity::$entity, id)
                }
            )*
        }
    };
}

entity_accessors! {
    Products => list_products, get_product_by_id, upsert_product, delete_product;
    Clients => list_clients, get_client_by_id, upsert_client, delete_client;
    Transactions => list_transactions, get_transaction_by_id, upsert_transaction, delete_transaction;
    Sales => list_sales, get_sale_by_id, upsert_sale, delete_sale;
    SaleItems => list_sale_items, get_sale_item_by_id, upsert_sale_item, delete_sale_item;
    Expenses => list_expenses, get_expense_by_id, upsert_expense, delete_expense;
    Income => list_income, get_income_by_id, upsert_income, delete_income;
    Insights => list_insights, get_insight_by_id, upsert_insight, delete_insight;
    Persons => list_persons, get_person_by_id, upsert_person, delete_person;
    Donors => list_donors, get_donor_by_id, upsert_donor, delete_donor;
    FinancialCategories => list_financial_categories, get_financial_category_by_id,
        upsert_financial_category, delete_financial_category;
    SystemUsers => list_system_users, get_system_user_by_id, upsert_system_user, delete_system_user;
    InvitationCodes => list_invitation_codes, get_invitation_code_by_id,
        upsert_invitation_code, delete_invitation_code;
    SystemConfig => list_system_configs, get_system_config_by_id,
        upsert_system_config, delete_system_config;
    SubscriptionStatus => list_subscription_statuses, get_subscription_status_by_id,
        upsert_subscription_status, delete_subscription_status;
    SyncMetadata => list_sync_metadata, get_sync_metadata_by_id, upsert_sync_metadata, delete_sync_metadata;
    SyncData => list_sync_data, get_sync_data_by_id, upsert_sync_data, delete_sync_data;
    RecurringExpenses => list_recurring_expenses, get_recurring_expense_by_id,
        upsert_recurring_expense, delete_recurring_expense;
}
