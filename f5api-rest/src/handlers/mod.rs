pub mod clientssl;
pub mod health;
