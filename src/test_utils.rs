// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Test implementations of the `Page` and `Table` traits, and the text of
//! reports from several versions of the report generator.

use crate::sections::ReportContent;
use crate::{Page, Table};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TestPage(usize, String);

impl TestPage {
    pub(crate) fn new(number: usize, text: impl Into<String>) -> Self {
        TestPage(number, text.into())
    }
}

impl Page for TestPage {
    fn page_number(&self) -> usize {
        self.0
    }

    fn text(&self) -> &str {
        &self.1
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TestTable(usize, Vec<Vec<String>>);

impl TestTable {
    pub(crate) fn new(page: usize, rows: &[&[&str]]) -> Self {
        TestTable(
            page,
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }
}

impl Table for TestTable {
    fn page_number(&self) -> usize {
        self.0
    }

    fn rows(&self) -> &[Vec<String>] {
        &self.1
    }
}

/// Numbers the given page texts from 1.
pub(crate) fn pages<S: AsRef<str>>(texts: &[S]) -> Vec<TestPage> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| TestPage::new(i + 1, text.as_ref()))
        .collect()
}

/// Places all given tables on the last page of the balances.
pub(crate) fn tables(tables: &[&[&[&str]]]) -> Vec<TestTable> {
    tables.iter().map(|rows| TestTable::new(4, rows)).collect()
}

pub(crate) fn report(texts: &[&str], grids: &[&[&[&str]]]) -> ReportContent {
    ReportContent::new(pages(texts), tables(grids))
}

const BALANCES: &str = "\
Main results
System Production
Produced Energy 569629 kWh/year Specific production 626 kWh/kWp/year
Balances and main results
GlobHor DiffHor T_Amb GlobInc GlobEff EArray E_Grid PR
kWh/m² kWh/m² °C kWh/m² kWh/m² kWh kWh ratio
January 96.1 32.59 11.85 114.8 107.1 35712 34807 0.839
February 105.0 41.20 13.10 120.2 112.9 37001 36015 0.827
March 150.2 52.31 16.40 165.3 156.0 50210 48935 0.817
April 178.4 60.12 19.95 183.6 174.1 55102 53702 0.807
May 205.6 68.40 23.80 203.9 193.7 60033 58520 0.792
June 212.3 70.05 27.10 206.5 196.2 59880 58371 0.780
July 221.9 66.71 29.45 217.0 206.4 62250 60678 0.771
August 198.7 62.33 29.10 203.4 193.3 58601 57121 0.774
September 160.5 51.90 26.20 174.2 165.3 50954 49667 0.786
October 132.8 45.02 21.40 153.1 144.9 45720 44563 0.801
November 101.4 35.66 15.90 123.6 116.2 37802 36840 0.822
December 88.2 30.44 12.60 109.9 102.5 31199 30410 0.836
Year 1851.1 616.73 20.46 2075.1 1968.6 584464 569629 0.800
Legends
GlobHor Global horizontal irradiation EArray Effective energy at the output of the array
DiffHor Horizontal diffuse irradiation E_Grid Energy injected into grid";

/// A three-array report with the module and the inverter side by side, and
/// an orientation table.
pub(crate) const SMA_V7: &[&str] = &[
    "\
Project: Example Solar Farm
Variant: Final design
PVsyst V7.4.5
Project summary
Geographical Site Latitude 35.23 °N
System summary
Grid-Connected System No 3D scene defined
Orientations
Orientation #1 Fixed planes
Tilt/Azimuth 10 / 0°
Orientation #2 East
Tilt/Azimuth 15 / -90°
System information
Page 1/6",
    "\
PV Array Characteristics
PV module Inverter
Manufacturer Hanwha Q Cells Manufacturer SMA
Model Q.Peak-Duo-XL-G11S.3 / BFG-595 Model Sunny Tripower_Core1 62-US-41
(Original PVsyst database) (Original PVsyst database)
Unit Nom. Power 595Wp Unit Nom. Power 62.5kWac
Number of PV modules 1530 units Number of inverters 8 units
Nominal (STC) 910 kWp Total power 500 kWac
Array #1 - INV01 MPPT 1-6
Orientation #1 Number of inverters 6 * MPPT 17% 1.0 unit
Tilt/Azimuth 10 / 0° Total power 62.5 kWac
Number of PV modules 216 units
Nominal (STC) 129 kWp
Modules 12 strings x 18 In series
At operating cond. (50°C)
Pmpp 117 kWp
U mpp 596 V
I mpp 198 A
Array #2 - INV02-05, 7,8 MPPT 1-6
Orientation #1 Number of inverters 36 * MPPT 17% 6.0 units
Tilt/Azimuth 10 / 0° Total power 375 kWac
Number of PV modules 1260 units
Nominal (STC) 750 kWp
Modules 70 strings x 18 In series
At operating cond. (50°C)
Pmpp 683 kWp
U mpp 596 V
I mpp 1155 A
Array #3 - INV06 MPPT 1-3
Orientation #2 Number of inverters 3 * MPPT 17% 0.5 unit
Number of PV modules 54 units
Nominal (STC) 32.1 kWp
Modules 3 strings x 18 In series
Total PV power
Nominal (STC) 910 kWp
Total 1530 modules
Total inverter power
Total power 500 kWac
Page 2/6",
    "\
Array losses
Array #1 - INV01 MPPT 1-6
Global array res. 44 mOhm Loss Fraction 1.5 % at STC
Array #2 - INV02-05, 7,8 MPPT 1-6
Global array res. 7.6 mOhm Loss Fraction 1.5 % at STC
System losses
Page 3/6",
    BALANCES,
];

/// The balances of [`SMA_V7`], as returned by a table extractor.
pub(crate) const SMA_V7_TABLES: &[&[&[&str]]] = &[&[
    &["", "GlobHor", "DiffHor", "T_Amb", "GlobInc", "GlobEff", "EArray", "E_Grid", "PR"],
    &["", "kWh/m²", "kWh/m²", "°C", "kWh/m²", "kWh/m²", "kWh", "kWh", "ratio"],
    &["January", "96.1", "32.59", "11.85", "114.8", "107.1", "35712", "34807", "0.839"],
    &["February", "105.0", "41.20", "13.10", "120.2", "112.9", "37001", "36015", "0.827"],
    &["March", "150.2", "52.31", "16.40", "165.3", "156.0", "50210", "48935", "0.817"],
    &["April", "178.4", "60.12", "19.95", "183.6", "174.1", "55102", "53702", "0.807"],
    &["May", "205.6", "68.40", "23.80", "203.9", "193.7", "60033", "58520", "0.792"],
    &["June", "212.3", "70.05", "27.10", "206.5", "196.2", "59880", "58371", "0.780"],
    &["July", "221.9", "66.71", "29.45", "217.0", "206.4", "62250", "60678", "0.771"],
    &["August", "198.7", "62.33", "29.10", "203.4", "193.3", "58601", "57121", "0.774"],
    &["September", "160.5", "51.90", "26.20", "174.2", "165.3", "50954", "49667", "0.786"],
    &["October", "132.8", "45.02", "21.40", "153.1", "144.9", "45720", "44563", "0.801"],
    &["November", "101.4", "35.66", "15.90", "123.6", "116.2", "37802", "36840", "0.822"],
    &["December", "88.2", "30.44", "12.60", "109.9", "102.5", "31199", "30410", "0.836"],
]];

/// A two sub-array report from an older generator, with the module and the
/// inverters described one after the other, and a single plane.
pub(crate) const SMA_V6: &[&str] = &[
    "\
PVSYST V6.88
Grid-Connected System: Simulation parameters
Project : Example Warehouse
Simulation variant : New simulation variant
Simulation parameters System type No 3D scene defined
Collector Plane Orientation Tilt 20° Azimuth -10°
PV Array Characteristics (2 kinds of array defined)
PV module Si-mono Model JKM 400M-72
Original PVsyst database Manufacturer Jinkosolar
Unit Nom. Power 400 Wp
Sub-array \"INV01 MPPT 1-2\"
Number of PV modules In series 18 modules In parallel 4 strings
Total number of PV modules Nb. modules 72 Unit Nom. Power 400 Wp
Array global power Nominal (STC) 28.8 kWp At operating cond. 26.3 kWp (50°C)
Array operating characteristics (50°C) U mpp 596 V I mpp 44 A
Inverter Model Sunny Tripower CORE1 50-US
Original PVsyst database Manufacturer SMA
Characteristics Operating Voltage 500-800 V Unit Nom. Power 50.0 kWac
Sub-array \"INV02-03 MPPT 1-3\"
Number of PV modules In series 18 modules In parallel 9 strings
Total number of PV modules Nb. modules 162 Unit Nom. Power 400 Wp
Array global power Nominal (STC) 64.8 kWp At operating cond. 59.2 kWp (50°C)
Array operating characteristics (50°C) U mpp 596 V I mpp 99 A
Inverter Model Sunny Tripower CORE1 50-US
Original PVsyst database Manufacturer SMA
Characteristics Operating Voltage 500-800 V Unit Nom. Power 50.0 kWac
Total Arrays global power Nominal (STC) 93.6 kWp Total 234 modules
PV Array loss factors
Array Soiling Losses Loss Fraction 3.0 %",
    BALANCES,
];

/// A single-array report without per-array blocks, for a plant of CHINT/CPS
/// inverters.
pub(crate) const SINGLE_ARRAY_CPS_V7: &[&str] = &[
    "\
Project: Example Ranch
PVsyst V7.2.11
Orientations
Orientation #1 Fixed plane
Tilt/Azimuth 20 / 0°
PV Array Characteristics
PV module Inverter
Manufacturer Jinkosolar Manufacturer CHINT POWER SYSTEMS
Model JKM540M-72HL4-V Model CPS SCA50KTL-DO/US-480
Unit Nom. Power 540 Wp Unit Nom. Power 50.0 kWac
Number of PV modules 5400 units Number of inverters 16 units
Nominal (STC) 2916 kWp Total power 800 kWac
Modules 300 strings x 18 In series
At operating cond. (50°C)
Pmpp 2652 kWp
U mpp 672 V
I mpp 3948 A
System losses
Array Soiling Losses Loss Fraction 2.0 %",
    BALANCES,
];
