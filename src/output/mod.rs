// Output formatting - terminal display of reports and clusters.

pub mod terminal;
