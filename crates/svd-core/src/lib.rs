//! Typed CMSIS-SVD device model decoded from a resolved XML tree.
//!
//! ```rust,no_run
//! let device = svd_core::load_device("rp2040.svd")?;
//! for peripheral in &device.peripherals {
//!     println!("{} @ {}", peripheral.name, peripheral.base_address);
//! }
//! # Ok::<(), svd_core::SvdError>(())
//! ```

pub mod decode;
pub mod model;
pub mod scalar;

use std::path::Path;

use svd_xml::{Diagnostic, Tree, XmlError};
use thiserror::Error;
use tracing::info;

pub use decode::{Element, FromNode};
pub use model::{
    AddressBlock, Cpu, Device, EnumeratedValue, Field, Interrupt, Peripheral, Register,
};
pub use scalar::{Access, BitRange, Identifier, ScalarError, ScaledNonNegativeInteger};

/// Error type produced while loading a device description.
#[derive(Debug, Error)]
pub enum SvdError {
    /// Reading or tokenizing the document failed.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// A required child element is absent after resolution.
    #[error("missing element: {parent}.{key}")]
    MissingElement { parent: String, key: String },
    /// An element with attributes or children where a value was expected.
    #[error("expected a value in {path}")]
    ExpectedScalar { path: String },
    /// A leaf value could not be converted to its type.
    #[error("conversion error in {path} ('{value}'): {source}")]
    Conversion {
        path: String,
        value: String,
        #[source]
        source: ScalarError,
    },
}

/// A decoded device plus the recoverable diagnostics raised on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub device: Device,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build, resolve and decode an SVD document.
pub fn decode_document(xml: &str) -> Result<Decoded, SvdError> {
    let tree = svd_xml::parse_tree(xml)?;
    decode_tree(tree)
}

/// Parse an SVD document into a [`Device`].
pub fn parse_device(xml: &str) -> Result<Device, SvdError> {
    decode_document(xml).map(|decoded| decoded.device)
}

/// Read and parse the SVD file at `path`.
pub fn load_device(path: impl AsRef<Path>) -> Result<Device, SvdError> {
    let tree = svd_xml::load_tree(path)?;
    decode_tree(tree).map(|decoded| decoded.device)
}

fn decode_tree(mut tree: Tree) -> Result<Decoded, SvdError> {
    let diagnostics = svd_xml::resolve(&mut tree);
    let device = Device::from_tree(&tree)?;
    info!(
        device = %device.name,
        peripherals = device.peripherals.len(),
        diagnostics = diagnostics.len(),
        "decoded device"
    );
    Ok(Decoded {
        device,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
        <device schemaVersion="1.1" xmlns:xs="http://www.w3.org/2001/XMLSchema-instance">
            <vendor>Raspberry Pi</vendor>
            <name>RP2040</name>
            <version>0.1</version>
            <description>Dual-core Cortex-M0+</description>
            <licenseText>BSD-3-Clause</licenseText>
            <cpu>
                <name>CM0PLUS</name>
                <revision>r0p1</revision>
                <endian>little</endian>
                <mpuPresent>true</mpuPresent>
                <fpuPresent>false</fpuPresent>
                <vtorPresent>1</vtorPresent>
                <nvicPrioBits>2</nvicPrioBits>
                <vendorSystickConfig>false</vendorSystickConfig>
                <deviceNumInterrupts>26</deviceNumInterrupts>
            </cpu>
            <addressUnitBits>8</addressUnitBits>
            <width>32</width>
            <size>32</size>
            <access>read-write</access>
            <resetValue>0x00000000</resetValue>
            <resetMask>0xFFFFFFFF</resetMask>
            <peripherals>
                <peripheral>
                    <name>UART0</name>
                    <description>UART</description>
                    <baseAddress>0x40034000</baseAddress>
                    <addressBlock>
                        <offset>0</offset>
                        <size>4k</size>
                        <usage>registers</usage>
                    </addressBlock>
                    <interrupt>
                        <name>UART0_IRQ</name>
                        <value>20</value>
                    </interrupt>
                    <registers>
                        <register>
                            <name>UARTDR</name>
                            <description>Data register</description>
                            <addressOffset>0x0000</addressOffset>
                            <resetValue>0x00000000</resetValue>
                            <fields>
                                <field>
                                    <name>OE</name>
                                    <bitRange>[11:11]</bitRange>
                                    <access>read-only</access>
                                </field>
                                <field>
                                    <name>DATA</name>
                                    <bitRange>[7:0]</bitRange>
                                </field>
                            </fields>
                        </register>
                        <register>
                            <name>UARTFR</name>
                            <addressOffset>0x18</addressOffset>
                            <access>read-only</access>
                            <resetValue>0x00000090</resetValue>
                            <fields>
                                <field>
                                    <name>TXFE</name>
                                    <lsb>7</lsb>
                                    <msb>7</msb>
                                </field>
                                <field>
                                    <name>BUSY</name>
                                    <bitOffset>3</bitOffset>
                                    <bitWidth>1</bitWidth>
                                    <enumeratedValues>
                                        <usage>read</usage>
                                        <enumeratedValue>
                                            <name>IDLE</name>
                                            <value>0</value>
                                        </enumeratedValue>
                                        <enumeratedValue>
                                            <name>BUSY</name>
                                            <value>1</value>
                                            <isDefault>false</isDefault>
                                        </enumeratedValue>
                                    </enumeratedValues>
                                </field>
                            </fields>
                        </register>
                    </registers>
                </peripheral>
                <peripheral derivedFrom="UART0">
                    <name>UART1</name>
                    <baseAddress>0x40038000</baseAddress>
                    <interrupt>
                        <name>UART1_IRQ</name>
                        <value>21</value>
                    </interrupt>
                </peripheral>
                <peripheral>
                    <name>SIO</name>
                    <baseAddress>0xD0000000</baseAddress>
                    <access>read-only</access>
                    <addressBlock>
                        <offset>0</offset>
                        <size>0x17c</size>
                        <usage>registers</usage>
                    </addressBlock>
                    <registers>
                        <register>
                            <name>CPUID</name>
                            <addressOffset>0</addressOffset>
                        </register>
                    </registers>
                </peripheral>
                <peripheral>
                    <name>EMPTY</name>
                    <baseAddress>0x50000000</baseAddress>
                </peripheral>
            </peripherals>
        </device>
    "#;

    fn device() -> Device {
        parse_device(FIXTURE).expect("decode fixture")
    }

    #[test]
    fn decodes_device_and_cpu() {
        let device = device();
        assert_eq!(device.name, "RP2040");
        assert_eq!(device.vendor.as_deref(), Some("Raspberry Pi"));
        assert!(device.vendor_id.is_none());
        assert_eq!(device.address_unit_bits.value(), 8);
        assert_eq!(device.width.value(), 32);
        assert_eq!(device.peripherals.len(), 4);

        let cpu = device.cpu.as_ref().expect("cpu");
        assert_eq!(cpu.name, "CM0PLUS");
        assert_eq!(cpu.mpu_present, Some(true));
        assert_eq!(cpu.fpu_present, Some(false));
        assert_eq!(cpu.vtor_present, Some(true));
        assert_eq!(cpu.dsp_present, None);
        assert!(!cpu.vendor_systick_config);
        assert_eq!(cpu.device_num_interrupts.map(|n| n.value()), Some(26));
    }

    #[test]
    fn registers_inherit_device_properties() {
        let device = device();
        let uart0 = device.peripheral("UART0").expect("UART0");
        let dr = uart0.register("UARTDR").expect("UARTDR");
        assert_eq!(dr.size.value(), 32);
        assert_eq!(dr.access, Some(Access::ReadWrite));
        assert_eq!(dr.reset_mask.map(|m| m.value()), Some(0xFFFF_FFFF));
        assert_eq!(uart0.register_address(dr), 0x4003_4000);

        let oe = dr.field("OE").expect("OE");
        assert_eq!(oe.access, Some(Access::ReadOnly));
        let data = dr.field("DATA").expect("DATA");
        assert_eq!(data.access, Some(Access::ReadWrite));
        assert_eq!(data.bit_range.count(), 8);
    }

    #[test]
    fn explicit_access_wins_over_inherited() {
        let device = device();
        let uart0 = device.peripheral("UART0").expect("UART0");
        let fr = uart0.register("UARTFR").expect("UARTFR");
        assert_eq!(fr.access, Some(Access::ReadOnly));
        assert_eq!(fr.reset_value.map(|v| v.value()), Some(0x90));
        for field in &fr.fields {
            assert_eq!(field.access, Some(Access::ReadOnly), "{}", field.name);
        }

        let sio = device.peripheral("SIO").expect("SIO");
        let cpuid = sio.register("CPUID").expect("CPUID");
        assert_eq!(cpuid.access, Some(Access::ReadOnly));
        assert_eq!(cpuid.size.value(), 32);
    }

    #[test]
    fn alternative_bit_range_forms() {
        let device = device();
        let fr = device
            .peripheral("UART0")
            .and_then(|p| p.register("UARTFR"))
            .expect("UARTFR");
        let txfe = fr.field("TXFE").expect("TXFE");
        assert_eq!(txfe.bit_range, BitRange::new(7, 7));
        let busy = fr.field("BUSY").expect("BUSY");
        assert_eq!(busy.bit_range, BitRange::new(3, 3));
        assert_eq!(busy.enumerated_values.len(), 2);
        let value = busy.enumerated_value("BUSY").expect("BUSY value");
        assert_eq!(value.value.as_deref(), Some("1"));
        assert_eq!(value.is_default, Some(false));
    }

    #[test]
    fn derived_peripheral_is_materialized() {
        let device = device();
        let uart0 = device.peripheral("UART0").expect("UART0");
        let uart1 = device.peripheral("UART1").expect("UART1");
        assert_eq!(uart1.derived_from.as_ref().map(Identifier::as_str), Some("UART0"));
        assert_eq!(uart1.base_address.value(), 0x4003_8000);
        assert_eq!(uart1.description.as_deref(), Some("UART"));
        assert_eq!(uart1.registers, uart0.registers);
        assert_eq!(uart1.address_blocks, uart0.address_blocks);
        assert_eq!(uart1.address_blocks[0].end(), 4096);
        assert_eq!(uart1.interrupts.len(), 1);
        assert_eq!(uart1.interrupts[0].name, "UART1_IRQ");
        assert_eq!(uart1.interrupts[0].value.value(), 21);
    }

    #[test]
    fn peripheral_without_registers_decodes() {
        let device = device();
        let empty = device.peripheral("EMPTY").expect("EMPTY");
        assert!(empty.registers.is_empty());
        assert!(empty.address_blocks.is_empty());
        assert!(empty.interrupts.is_empty());
    }

    #[test]
    fn decoding_is_idempotent() {
        let mut tree = svd_xml::parse_tree(FIXTURE).expect("parse");
        svd_xml::resolve(&mut tree);
        let first = Device::from_tree(&tree).expect("first decode");
        let second = Device::from_tree(&tree).expect("second decode");
        assert_eq!(first, second);
        assert_eq!(first, device());
    }

    #[test]
    fn unresolved_register_prototype_fails_at_decode() {
        let xml = r#"
            <device>
                <name>CHIP</name>
                <version>1</version>
                <description>test</description>
                <addressUnitBits>8</addressUnitBits>
                <width>32</width>
                <size>32</size>
                <peripherals>
                    <peripheral>
                        <name>P</name>
                        <baseAddress>0</baseAddress>
                        <registers>
                            <register derivedFrom="NOPE">
                                <name>R</name>
                            </register>
                        </registers>
                    </peripheral>
                </peripherals>
            </device>
        "#;
        let mut tree = svd_xml::parse_tree(xml).expect("parse");
        let diagnostics = svd_xml::resolve(&mut tree);
        assert_eq!(diagnostics.len(), 1);

        let err = Device::from_tree(&tree).unwrap_err();
        match err {
            SvdError::MissingElement { parent, key } => {
                assert_eq!(parent, "device[CHIP]/peripherals/peripheral[P]/registers/register[R]");
                assert_eq!(key, "addressOffset");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn diagnostics_are_returned_with_device() {
        let xml = FIXTURE.replace(
            r#"<peripheral derivedFrom="UART0">"#,
            r#"<peripheral derivedFrom="UART9">"#,
        );
        let decoded = decode_document(&xml).expect("decode");
        assert_eq!(decoded.diagnostics.len(), 1);
        assert_eq!(
            decoded.diagnostics[0],
            Diagnostic::UnresolvedPrototype {
                path: "device[RP2040]/peripherals/peripheral[UART1]".to_string(),
                prototype: "UART9".to_string(),
            }
        );
        let uart1 = decoded.device.peripheral("UART1").expect("UART1");
        assert!(uart1.registers.is_empty());
        assert!(uart1.description.is_none());

        let xml = FIXTURE.replace(
            "<description>UART</description>",
            "<description>UART</description><version>2</version>",
        );
        let decoded = decode_document(&xml).expect("decode");
        assert!(decoded.diagnostics.is_empty());
        let uart1 = decoded.device.peripheral("UART1").expect("UART1");
        assert_eq!(uart1.version.as_deref(), Some("2"));
    }

    #[test]
    fn bad_scalar_aborts_decoding() {
        let xml = FIXTURE.replace("<bitRange>[7:0]</bitRange>", "<bitRange>7..0</bitRange>");
        let err = parse_device(&xml).unwrap_err();
        match err {
            SvdError::Conversion { path, value, .. } => {
                assert!(path.ends_with("field[DATA]/bitRange"), "{path}");
                assert_eq!(value, "7..0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn xml_errors_propagate() {
        let err = parse_device("<device><name>X</device>").unwrap_err();
        assert!(matches!(err, SvdError::Xml(XmlError::Malformed { .. })));
        let err = load_device("/nonexistent/chip.svd").unwrap_err();
        assert!(matches!(err, SvdError::Xml(XmlError::Io { .. })));
    }
}
