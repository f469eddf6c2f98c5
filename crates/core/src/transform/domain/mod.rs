pub mod region_transform;
