use std::env;
use std::error::Error;

use svd_mmio::xml::{self, Tree};

const SAMPLE: &str = r#"
    <device>
        <name>DEMO</name>
        <size>32</size>
        <access>read-write</access>
        <peripherals>
            <peripheral>
                <name>TIMER0</name>
                <baseAddress>0x40054000</baseAddress>
                <registers>
                    <register>
                        <name>CTRL</name>
                        <addressOffset>0</addressOffset>
                    </register>
                </registers>
            </peripheral>
            <peripheral derivedFrom="TIMER0">
                <name>TIMER1</name>
                <baseAddress>0x40058000</baseAddress>
            </peripheral>
            <peripheral derivedFrom="TIMER7">
                <name>TIMER2</name>
                <baseAddress>0x4005C000</baseAddress>
            </peripheral>
        </peripherals>
    </device>
"#;

/// Print the tree after both resolution passes. Pass a path to an .svd file
/// and optionally a peripheral name; without arguments a built-in sample is
/// used.
fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let mut tree = match args.next() {
        Some(path) => xml::load_tree(path)?,
        None => xml::parse_tree(SAMPLE)?,
    };
    let focus = args.next();

    for diagnostic in xml::resolve(&mut tree) {
        eprintln!("warning: {diagnostic}");
    }

    let id = match focus.as_deref() {
        Some(name) => find_peripheral(&tree, name)
            .ok_or_else(|| format!("no peripheral named {name}"))?,
        None => tree.root(),
    };
    println!("{}", tree.render(id));
    Ok(())
}

fn find_peripheral(tree: &Tree, name: &str) -> Option<xml::NodeId> {
    let peripherals = tree.child(tree.root(), "peripherals")?;
    tree.children_named(peripherals, "peripheral")
        .find(|&id| tree.label(id) == Some(name))
}
