pub mod commit;
pub mod parts;
pub mod run;
pub mod show;
