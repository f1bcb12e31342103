//! Resolved SVD entities: device → peripherals → registers → fields.
//!
//! Every entity is a plain owned value. `derivedFrom` and the register
//! property group have already been materialized into copies by the time
//! these types are built, so a derived peripheral carries all of its
//! prototype's registers itself.

use svd_xml::Tree;

use crate::decode::{Element, FromNode};
use crate::scalar::{Access, BitRange, Identifier, ScaledNonNegativeInteger};
use crate::SvdError;

/// Top-level description of a microcontroller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Device {
    /// Full vendor name.
    pub vendor: Option<String>,
    /// Short vendor abbreviation, e.g. `TI`.
    pub vendor_id: Option<Identifier>,
    pub name: Identifier,
    pub series: Option<String>,
    /// Version of the description file.
    pub version: String,
    pub description: String,
    /// Legal disclaimer copied into generated headers.
    pub license_text: Option<String>,
    pub cpu: Option<Cpu>,
    pub header_system_filename: Option<Identifier>,
    pub header_definitions_prefix: Option<Identifier>,
    /// Bits selected by one address, 8 for byte addressable devices.
    pub address_unit_bits: ScaledNonNegativeInteger,
    /// Bit width of the widest single bus transfer.
    pub width: ScaledNonNegativeInteger,
    pub peripherals: Vec<Peripheral>,
}

impl Device {
    /// Decode a tree that has already gone through [`svd_xml::resolve`].
    pub fn from_tree(tree: &Tree) -> Result<Self, SvdError> {
        Self::from_node(Element::root(tree))
    }

    pub fn peripheral(&self, name: &str) -> Option<&Peripheral> {
        self.peripherals.iter().find(|p| p.name == name)
    }
}

impl FromNode for Device {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        Ok(Self {
            vendor: element.optional("vendor")?,
            vendor_id: element.optional("vendorID")?,
            name: element.required("name")?,
            series: element.optional("series")?,
            version: element.required("version")?,
            description: element.required("description")?,
            license_text: element.optional("licenseText")?,
            cpu: element.optional("cpu")?,
            header_system_filename: element.optional("headerSystemFilename")?,
            header_definitions_prefix: element.optional("headerDefinitionsPrefix")?,
            address_unit_bits: element.required("addressUnitBits")?,
            width: element.required("width")?,
            peripherals: element.list("peripherals")?,
        })
    }
}

/// Processor core details.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cpu {
    /// Processor name such as `CM0PLUS`.
    pub name: String,
    /// Hardware revision in `rNpM` form.
    pub revision: String,
    /// One of `little`, `big`, `selectable`, `other`.
    pub endian: String,
    pub mpu_present: Option<bool>,
    pub fpu_present: Option<bool>,
    pub fpu_dp: Option<bool>,
    pub dsp_present: Option<bool>,
    pub icache_present: Option<bool>,
    pub dcache_present: Option<bool>,
    pub itcm_present: Option<bool>,
    pub dtcm_present: Option<bool>,
    /// VTOR is assumed present when unspecified.
    pub vtor_present: Option<bool>,
    /// NVIC priority bits.
    pub nvic_prio_bits: ScaledNonNegativeInteger,
    /// Whether a vendor specific SysTick replaces the Arm one.
    pub vendor_systick_config: bool,
    pub device_num_interrupts: Option<ScaledNonNegativeInteger>,
}

impl FromNode for Cpu {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        Ok(Self {
            name: element.required("name")?,
            revision: element.required("revision")?,
            endian: element.required("endian")?,
            mpu_present: element.optional("mpuPresent")?,
            fpu_present: element.optional("fpuPresent")?,
            fpu_dp: element.optional("fpuDP")?,
            dsp_present: element.optional("dspPresent")?,
            icache_present: element.optional("icachePresent")?,
            dcache_present: element.optional("dcachePresent")?,
            itcm_present: element.optional("itcmPresent")?,
            dtcm_present: element.optional("dtcmPresent")?,
            vtor_present: element.optional("vtorPresent")?,
            nvic_prio_bits: element.required("nvicPrioBits")?,
            vendor_systick_config: element.required("vendorSystickConfig")?,
            device_num_interrupts: element.optional("deviceNumInterrupts")?,
        })
    }
}

/// A peripheral mapped at `base_address`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Peripheral {
    /// Prototype this peripheral was copied from.
    pub derived_from: Option<Identifier>,
    pub name: Identifier,
    pub version: Option<String>,
    pub description: Option<String>,
    pub alternate_peripheral: Option<Identifier>,
    pub group_name: Option<String>,
    /// Prefix placed in front of each register name.
    pub prepend_to_name: Option<Identifier>,
    /// Postfix appended to each register name.
    pub append_to_name: Option<Identifier>,
    pub header_struct_name: Option<Identifier>,
    pub disable_condition: Option<String>,
    pub base_address: ScaledNonNegativeInteger,
    pub address_blocks: Vec<AddressBlock>,
    pub interrupts: Vec<Interrupt>,
    pub registers: Vec<Register>,
}

impl Peripheral {
    pub fn register(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Absolute address of `register` inside this peripheral.
    pub fn register_address(&self, register: &Register) -> u64 {
        self.base_address
            .value()
            .saturating_add(register.address_offset.value())
    }
}

impl FromNode for Peripheral {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        Ok(Self {
            derived_from: element.attribute("derivedFrom")?,
            name: element.required("name")?,
            version: element.optional("version")?,
            description: element.optional("description")?,
            alternate_peripheral: element.optional("alternatePeripheral")?,
            group_name: element.optional("groupName")?,
            prepend_to_name: element.optional("prependToName")?,
            append_to_name: element.optional("appendToName")?,
            header_struct_name: element.optional("headerStructName")?,
            disable_condition: element.optional("disableCondition")?,
            base_address: element.required("baseAddress")?,
            address_blocks: element.all("addressBlock")?,
            interrupts: element.all("interrupt")?,
            registers: element.list("registers")?,
        })
    }
}

/// Address range assigned exclusively to a peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AddressBlock {
    /// Start relative to the peripheral base address.
    pub offset: ScaledNonNegativeInteger,
    /// Length in address units.
    pub size: ScaledNonNegativeInteger,
    /// `registers`, `buffer` or `reserved`.
    pub usage: String,
    pub protection: Option<String>,
}

impl AddressBlock {
    /// Offset one past the last address unit covered by the block.
    pub fn end(&self) -> u64 {
        self.offset.value().saturating_add(self.size.value())
    }
}

impl FromNode for AddressBlock {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        Ok(Self {
            offset: element.required("offset")?,
            size: element.required("size")?,
            usage: element.required("usage")?,
            protection: element.optional("protection")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Interrupt {
    pub name: String,
    pub description: Option<String>,
    /// Interrupt number.
    pub value: ScaledNonNegativeInteger,
}

impl FromNode for Interrupt {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        Ok(Self {
            name: element.required("name")?,
            description: element.optional("description")?,
            value: element.required("value")?,
        })
    }
}

/// A memory mapped register, optionally split into fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Register {
    pub derived_from: Option<Identifier>,
    pub name: Identifier,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub alternate_group: Option<Identifier>,
    pub alternate_register: Option<Identifier>,
    /// Offset from the peripheral base address.
    pub address_offset: ScaledNonNegativeInteger,
    /// Width in bits.
    pub size: ScaledNonNegativeInteger,
    pub access: Option<Access>,
    pub protection: Option<String>,
    pub reset_value: Option<ScaledNonNegativeInteger>,
    /// Bits that have a defined reset value.
    pub reset_mask: Option<ScaledNonNegativeInteger>,
    pub data_type: Option<String>,
    pub modified_write_values: Option<String>,
    pub write_constraint: Option<String>,
    pub read_action: Option<String>,
    pub fields: Vec<Field>,
}

impl Register {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl FromNode for Register {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        Ok(Self {
            derived_from: element.attribute("derivedFrom")?,
            name: element.required("name")?,
            display_name: element.optional("displayName")?,
            description: element.optional("description")?,
            alternate_group: element.optional("alternateGroup")?,
            alternate_register: element.optional("alternateRegister")?,
            address_offset: element.required("addressOffset")?,
            size: element.required("size")?,
            access: element.optional("access")?,
            protection: element.optional("protection")?,
            reset_value: element.optional("resetValue")?,
            reset_mask: element.optional("resetMask")?,
            data_type: element.optional("dataType")?,
            modified_write_values: element.optional("modifiedWriteValues")?,
            write_constraint: element.optional("writeConstraint")?,
            read_action: element.optional("readAction")?,
            fields: element.list("fields")?,
        })
    }
}

/// A bit-field of a register.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Field {
    pub derived_from: Option<Identifier>,
    pub name: Identifier,
    pub description: Option<String>,
    pub bit_range: BitRange,
    pub access: Option<Access>,
    pub modified_write_values: Option<String>,
    pub write_constraint: Option<String>,
    pub read_action: Option<String>,
    pub enumerated_values: Vec<EnumeratedValue>,
}

impl Field {
    pub fn enumerated_value(&self, name: &str) -> Option<&EnumeratedValue> {
        self.enumerated_values.iter().find(|v| v.name == name)
    }
}

impl FromNode for Field {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        Ok(Self {
            derived_from: element.attribute("derivedFrom")?,
            name: element.required("name")?,
            description: element.optional("description")?,
            bit_range: bit_range(element)?,
            access: element.optional("access")?,
            modified_write_values: element.optional("modifiedWriteValues")?,
            write_constraint: element.optional("writeConstraint")?,
            read_action: element.optional("readAction")?,
            enumerated_values: match element.child("enumeratedValues") {
                // the container may also carry `name` and `usage`
                Some(values) => values.all("enumeratedValue")?,
                None => Vec::new(),
            },
        })
    }
}

/// A field position is written as `bitRange`, as `lsb` + `msb`, or as
/// `bitOffset` + `bitWidth`. `bitRange` wins when several are present.
fn bit_range(element: Element<'_>) -> Result<BitRange, SvdError> {
    if let Some(range) = element.optional("bitRange")? {
        return Ok(range);
    }
    if let (Some(lsb), Some(msb)) = (element.optional("lsb")?, element.optional("msb")?) {
        return Ok(BitRange::new(lsb, msb));
    }
    if let (Some(offset), Some(width)) = (
        element.optional::<u32>("bitOffset")?,
        element.optional::<u32>("bitWidth")?,
    ) {
        return BitRange::from_offset_width(offset, width).map_err(|source| {
            SvdError::Conversion {
                path: element.path(),
                value: format!("bitOffset={offset} bitWidth={width}"),
                source,
            }
        });
    }
    // report the canonical form
    element.required("bitRange")
}

/// Symbolic name for a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EnumeratedValue {
    pub name: Identifier,
    pub description: Option<String>,
    /// Raw value token; may contain `x` don't-care digits.
    pub value: Option<String>,
    pub is_default: Option<bool>,
}

impl FromNode for EnumeratedValue {
    fn from_node(element: Element<'_>) -> Result<Self, SvdError> {
        Ok(Self {
            name: element.required("name")?,
            description: element.optional("description")?,
            value: element.optional("value")?,
            is_default: element.optional("isDefault")?,
        })
    }
}
