// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the traits that need to be implemented by the types
//! that represent an extracted page and an extracted table.

/**
This trait needs to be implemented by the type that represents one page of
linearized report text.

Read more about why this is necessary [here][crate#the-page-and-table-traits].

<details>
<summary>Example implementation for a pdf text extractor:</summary>

```ignore
struct ExtractedPage {
    number: usize,
    text: String,
}

impl frequenz_pv_design_report::Page for ExtractedPage {
    fn page_number(&self) -> usize {
        self.number
    }

    fn text(&self) -> &str {
        &self.text
    }
}
```

</details>
*/
pub trait Page {
    /// Returns the 1-based page number.
    fn page_number(&self) -> usize;
    /// Returns the text content of the page, with one report line per line.
    fn text(&self) -> &str;
}

/**
This trait needs to be implemented by the type that represents a table
extracted as a grid of string cells.

Tables are optional. Every section can be located from the page text alone,
but when a table extractor is available its grids are preferred for the
monthly production table.

<details>
<summary>Example implementation:</summary>

```ignore
struct ExtractedTable {
    page: usize,
    cells: Vec<Vec<String>>,
}

impl frequenz_pv_design_report::Table for ExtractedTable {
    fn page_number(&self) -> usize {
        self.page
    }

    fn rows(&self) -> &[Vec<String>] {
        &self.cells
    }
}
```

</details>
*/
pub trait Table {
    /// Returns the 1-based number of the page the table was found on.
    fn page_number(&self) -> usize;
    /// Returns the rows of the table, in order.
    fn rows(&self) -> &[Vec<String>];
}
