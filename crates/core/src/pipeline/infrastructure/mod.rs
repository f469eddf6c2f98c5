pub mod background_task;
