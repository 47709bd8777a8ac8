//! Point-list integration tests.

mod point_list_test;
mod tour_test;
