pub mod data {
    pub mod names;
    pub mod store;
}

pub mod plot {
    pub mod chart;
}

pub mod ui {
    pub mod console;
    pub mod menu;
    pub mod prompt;
}
