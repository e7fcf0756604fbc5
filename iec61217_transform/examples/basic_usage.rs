use iec61217_transform::{
    CollimatorParameters, Frame, GantryParameters, IecTransformTree, KinematicState,
    TransformResult,
};
use nalgebra::Point3;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use uom::si::angle::degree;
use uom::si::f64::{Angle, Length};
use uom::si::length::millimeter;

fn main() -> TransformResult<()> {
    let _ = TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    let mut tree = IecTransformTree::new();

    println!("Frame hierarchy:");
    for (parent, child) in tree.hierarchy().edges() {
        println!("  {parent} -> {child}");
    }

    tree.update_gantry_to_fixed_reference(GantryParameters {
        rotation_angle: Angle::new::<degree>(90.0),
        ..Default::default()
    });
    tree.update_collimator_to_gantry(CollimatorParameters {
        rotation_angle: Angle::new::<degree>(45.0),
        offset_z: Length::new::<millimeter>(0.0),
    });

    // A point of the patient image (RAS) seen from the collimator
    let ras_to_collimator = tree.transform_between(Frame::Ras, Frame::Collimator)?;
    let p = ras_to_collimator.transform_point(&Point3::new(10.0, 20.0, 30.0));
    println!(
        "{}: (10, 20, 30) -> ({:.3}, {:.3}, {:.3})",
        tree.transform_name_between(Frame::Ras, Frame::Collimator),
        p.x,
        p.y,
        p.z
    );

    // Same machine, driven from a stored kinematic state.
    let state = KinematicState::from_ron(
        "(gantry: (rotation_deg: 180.0), patient_support_rotation_deg: 90.0)",
    )?;
    state.apply(&mut tree)?;
    println!("{tree}");

    Ok(())
}
