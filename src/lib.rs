#![cfg_attr(docsrs, feature(doc_cfg))]
//! CMSIS-SVD facade that re-exports the workspace crates.
//!
//! ```rust,no_run
//! use svd_mmio::{load_device, Access};
//!
//! # fn run() -> Result<(), svd_mmio::SvdError> {
//! let device = load_device("rp2040.svd")?;
//! for peripheral in &device.peripherals {
//!     for register in &peripheral.registers {
//!         let writable = register.access.as_ref().map_or(false, Access::is_writable);
//!         println!(
//!             "{}.{} @ 0x{:08x} writable={writable}",
//!             peripheral.name,
//!             register.name,
//!             peripheral.register_address(register),
//!         );
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The lower level passes are available through [`xml`] when the resolved
//! tree itself is of interest:
//!
//! ```rust,no_run
//! # fn run(text: &str) -> Result<(), svd_mmio::SvdError> {
//! let mut tree = svd_mmio::xml::parse_tree(text)?;
//! for diagnostic in svd_mmio::xml::resolve(&mut tree) {
//!     eprintln!("{diagnostic}");
//! }
//! let device = svd_mmio::Device::from_tree(&tree)?;
//! # let _ = device;
//! # Ok(())
//! # }
//! ```

pub use svd_xml as xml;

pub use svd_core::{
    decode_document, load_device, parse_device, Access, AddressBlock, BitRange, Cpu, Decoded,
    Device, Element, EnumeratedValue, Field, FromNode, Identifier, Interrupt, Peripheral,
    Register, ScalarError, ScaledNonNegativeInteger, SvdError,
};
pub use svd_xml::Diagnostic;

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <device>
            <name>CHIP</name>
            <version>1</version>
            <description>test</description>
            <addressUnitBits>8</addressUnitBits>
            <width>32</width>
            <size>32</size>
            <peripherals>
                <peripheral>
                    <name>GPIO</name>
                    <baseAddress>0x40014000</baseAddress>
                    <registers>
                        <register>
                            <name>OUT</name>
                            <addressOffset>0x10</addressOffset>
                        </register>
                    </registers>
                </peripheral>
            </peripherals>
        </device>
    "#;

    #[test]
    fn facade_exposes_scalar_and_decode_types() {
        let device = parse_device(FIXTURE).expect("decode fixture");
        let gpio = device.peripheral("GPIO").expect("GPIO");
        let name: &Identifier = &gpio.name;
        assert_eq!(name.as_str(), "GPIO");
        assert_eq!(gpio.register_address(&gpio.registers[0]), 0x4001_4010);

        let err: ScalarError = "not an identifier".parse::<Identifier>().unwrap_err();
        assert_eq!(err, ScalarError::Identifier);

        let tree = xml::parse_tree(FIXTURE).expect("parse");
        let width: ScaledNonNegativeInteger =
            Element::root(&tree).required("width").expect("width");
        assert_eq!(width.value(), 32);
        let decoded = <Device as FromNode>::from_node(Element::root(&tree)).expect("decode device");
        let cpu: Option<&Cpu> = decoded.cpu.as_ref();
        assert!(cpu.is_none());
    }
}
