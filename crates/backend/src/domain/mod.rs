pub mod a001_jd_account;
pub mod a002_jd_category;
pub mod a003_jd_sku;
pub mod a004_jd_delivery_address;
pub mod a005_jd_order;
pub mod a006_jd_payment;
pub mod a007_jd_logistics;
pub mod a008_jd_invoice;
pub mod a009_jd_after_sales;
pub mod a010_jd_comment;
