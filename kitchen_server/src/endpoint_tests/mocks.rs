use kitchen_engine::{
    cart_objects::MergeSummary,
    db_types::{
        CartItem,
        CartLine,
        CartLineUpdate,
        CartOwner,
        CustomerSummary,
        MenuItem,
        MenuItemUpdate,
        NewCartLine,
        NewMenuItem,
        NewUser,
        Order,
        OrderLine,
        OrderStatusType,
        Payment,
        SettingsUpdate,
        SystemSettings,
        User,
    },
    order_objects::{CheckoutParams, OrderQueryFilter, OrderWithPayment, PaymentQueryFilter},
    traits::{
        AccountApiError,
        AccountManagement,
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        OrderFlowError,
        OrderManagement,
        SettingsError,
        SettingsManagement,
    },
};
use mockall::mock;

mock! {
    pub KitchenDb {}
    impl CatalogManagement for KitchenDb {
        async fn fetch_menu(&self, available_only: bool) -> Result<Vec<MenuItem>, CatalogError>;
        async fn fetch_menu_item(&self, id: i64) -> Result<Option<MenuItem>, CatalogError>;
        async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CatalogError>;
        async fn update_menu_item(&self, id: i64, update: MenuItemUpdate) -> Result<MenuItem, CatalogError>;
        async fn delete_menu_item(&self, id: i64) -> Result<(), CatalogError>;
        async fn toggle_menu_item(&self, id: i64) -> Result<MenuItem, CatalogError>;
        async fn add_menu_image(&self, id: i64, url: &str) -> Result<MenuItem, CatalogError>;
        async fn remove_menu_image(&self, id: i64, url: &str) -> Result<MenuItem, CatalogError>;
    }
    impl CartManagement for KitchenDb {
        async fn fetch_cart(&self, owner: &CartOwner) -> Result<Vec<CartItem>, CartError>;
        async fn add_to_cart(&self, owner: &CartOwner, line: NewCartLine, max_quantity: i64) -> Result<CartLine, CartError>;
        async fn update_cart_line(&self, owner: &CartOwner, line_id: i64, update: CartLineUpdate, max_quantity: i64) -> Result<CartLine, CartError>;
        async fn remove_cart_line(&self, owner: &CartOwner, line_id: i64) -> Result<(), CartError>;
        async fn clear_cart(&self, owner: &CartOwner) -> Result<u64, CartError>;
        async fn merge_guest_cart(&self, session_id: &str, user_id: i64, max_quantity: i64) -> Result<MergeSummary, CartError>;
    }
    impl OrderManagement for KitchenDb {
        async fn create_order_from_cart(&self, user_id: i64, checkout: CheckoutParams) -> Result<OrderWithPayment, OrderFlowError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;
        async fn update_order_status(&self, order_id: i64, from: OrderStatusType, to: OrderStatusType) -> Result<Order, OrderFlowError>;
        async fn update_admin_notes(&self, order_id: i64, notes: Option<String>) -> Result<Order, OrderFlowError>;
        async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, OrderFlowError>;
        async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, OrderFlowError>;
        async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, OrderFlowError>;
        async fn attach_payment_proof(&self, payment_id: i64, proof_ref: &str) -> Result<Payment, OrderFlowError>;
        async fn confirm_payment(&self, payment_id: i64, reviewer_id: i64, transaction_ref: Option<String>) -> Result<(Payment, Order), OrderFlowError>;
        async fn reject_payment(&self, payment_id: i64, reviewer_id: i64, reason: &str) -> Result<Payment, OrderFlowError>;
    }
    impl AccountManagement for KitchenDb {
        async fn insert_user(&self, user: NewUser) -> Result<User, AccountApiError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AccountApiError>;
        async fn fetch_customers(&self) -> Result<Vec<CustomerSummary>, AccountApiError>;
    }
    impl SettingsManagement for KitchenDb {
        async fn fetch_settings(&self) -> Result<SystemSettings, SettingsError>;
        async fn update_settings(&self, update: SettingsUpdate) -> Result<SystemSettings, SettingsError>;
        async fn toggle_ordering(&self) -> Result<bool, SettingsError>;
    }
}
