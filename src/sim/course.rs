//! Demo courses
//!
//! Two layouts:
//! - `obstacle_course`: a walled box with circles, triangles and ellipses at
//!   random spins, seeded from the world RNG
//! - `test_course`: curved concave corner walls and breakable obstacles

use rand::Rng;

use super::detector::CollisionDetector;
use super::entity::EntityId;
use super::shape::Shape;
use super::state::World;
use crate::error::Result;
use crate::math::{CurvablePoint, Point, Vector, degrees_to_radians};

/// Ids of everything a course spawned
#[derive(Debug, Clone, Default)]
pub struct Course {
    pub balls: Vec<EntityId>,
    pub walls: Vec<EntityId>,
    pub breakable_walls: Vec<EntityId>,
}

fn horizontal_wall() -> Shape {
    Shape::rectangle(1200.0, 100.0, 1.0)
}

fn vertical_wall() -> Shape {
    Shape::rectangle(100.0, 900.0, 1.0)
}

fn circle_wall() -> Shape {
    Shape::circle(50.0, 1.0)
}

fn ellipse_wall() -> Shape {
    Shape::ellipse(30.0, 80.0, 1.0)
}

fn triangle_wall() -> Shape {
    Shape::polygon(
        &[
            Point::new(0.0, -80.0),
            Point::new(80.0, 50.0),
            Point::new(-80.0, 50.0),
        ],
        1.0,
    )
}

/// Concave wall whose inner side is two Bezier curves
pub fn curved_concave_wall() -> Shape {
    Shape::curvable_polygon(
        &[
            CurvablePoint::anchor(80.0, 100.0),
            CurvablePoint::anchor(-50.0, 100.0),
            CurvablePoint::anchor(-50.0, -100.0),
            CurvablePoint::anchor(80.0, -100.0),
            CurvablePoint::control(35.0, -75.0),
            CurvablePoint::control(35.0, -25.0),
            CurvablePoint::anchor(35.0, 0.0),
            CurvablePoint::control(35.0, 25.0),
            CurvablePoint::control(35.0, 50.0),
        ],
        2.0,
    )
}

/// Degrees to the world's configured angle unit
fn angle<D: CollisionDetector>(world: &World<D>, degrees: f64) -> f64 {
    world
        .settings()
        .angle_unit
        .from_radians(degrees_to_radians(degrees))
}

fn random_degrees<D: CollisionDetector>(world: &mut World<D>, spread: f64) -> f64 {
    let degrees = world.rng().random::<f64>() * spread - spread / 2.0;
    angle(world, degrees)
}

/// Walled box with spinning obstacles and one ball in the middle
pub fn obstacle_course<D: CollisionDetector>(world: &mut World<D>) -> Result<Course> {
    let mut course = Course::default();

    let borders = [
        (horizontal_wall(), 0.0, 350.0),
        (horizontal_wall(), 0.0, -350.0),
        (vertical_wall(), -550.0, 0.0),
        (vertical_wall(), 550.0, 0.0),
    ];
    for (shape, x, y) in borders {
        let wobble = random_degrees(world, 10.0);
        course
            .walls
            .push(world.spawn_wall(shape, Vector::new_2d(x, y), wobble)?);
    }

    let obstacles = [
        (circle_wall(), 400.0, 0.0),
        (triangle_wall(), -400.0, 0.0),
        (triangle_wall(), 0.0, 200.0),
        (circle_wall(), 0.0, -200.0),
        (ellipse_wall(), 250.0, 150.0),
        (triangle_wall(), 250.0, -150.0),
        (triangle_wall(), -250.0, 150.0),
        (ellipse_wall(), -250.0, -150.0),
    ];
    for (shape, x, y) in obstacles {
        let spin = random_degrees(world, 360.0);
        course
            .walls
            .push(world.spawn_wall(shape, Vector::new_2d(x, y), spin)?);
    }

    course.balls.push(world.spawn_ball(Vector::zero_2d())?);
    log::info!(
        "Obstacle course ready: {} walls, {} ball",
        course.walls.len(),
        course.balls.len()
    );
    Ok(course)
}

/// Curved corners and breakable obstacles
pub fn test_course<D: CollisionDetector>(world: &mut World<D>) -> Result<Course> {
    let mut course = Course::default();

    let borders = [
        (horizontal_wall(), 0.0, 350.0),
        (horizontal_wall(), 0.0, -350.0),
        (vertical_wall(), -550.0, 50.0),
        (vertical_wall(), 550.0, -50.0),
    ];
    for (shape, x, y) in borders {
        course
            .walls
            .push(world.spawn_wall(shape, Vector::new_2d(x, y), 0.0)?);
    }

    let corners = [
        (-500.0, -300.0, 45.0),
        (500.0, -300.0, 135.0),
        (-500.0, 300.0, -45.0),
        (500.0, 300.0, -135.0),
    ];
    for (x, y, degrees) in corners {
        let corner_angle = angle(world, degrees);
        course.walls.push(world.spawn_wall(
            curved_concave_wall(),
            Vector::new_2d(x, y),
            corner_angle,
        )?);
    }

    let breakables = [
        (circle_wall(), 400.0, 0.0, 0.0, 3),
        (ellipse_wall(), -400.0, 0.0, 0.0, 3),
        (triangle_wall(), 0.0, 200.0, 0.0, 3),
        (Shape::rectangle(20.0, 60.0, 1.0), -100.0, 100.0, 30.0, 2),
        (Shape::rectangle(20.0, 60.0, 1.0), 100.0, -100.0, 180.0, 2),
        (circle_wall(), 0.0, -200.0, 0.0, 3),
    ];
    for (shape, x, y, degrees, hitpoints) in breakables {
        let wall_angle = angle(world, degrees);
        course.breakable_walls.push(world.spawn_breakable_wall(
            shape,
            Vector::new_2d(x, y),
            wall_angle,
            hitpoints,
        )?);
    }

    course.balls.push(world.spawn_ball(Vector::zero_2d())?);
    log::info!(
        "Test course ready: {} walls, {} breakable walls",
        course.walls.len(),
        course.breakable_walls.len()
    );
    Ok(course)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT;
    use crate::settings::Settings;
    use crate::sim::entity::Entity;
    use crate::sim::tick::{TickInput, tick};

    #[test]
    fn test_obstacle_course_layout() {
        let mut world = World::new(Settings::default());
        let course = obstacle_course(&mut world).unwrap();
        assert_eq!(course.walls.len(), 12);
        assert_eq!(course.balls.len(), 1);
        assert_eq!(world.detector().len(), 13);
    }

    #[test]
    fn test_obstacle_course_is_seeded() {
        let angles = |seed| {
            let mut world = World::new(Settings {
                seed,
                ..Settings::default()
            });
            let course = obstacle_course(&mut world).unwrap();
            course
                .walls
                .iter()
                .map(|id| world.entity(*id).unwrap().angle())
                .collect::<Vec<_>>()
        };
        assert_eq!(angles(1), angles(1));
        assert_ne!(angles(1), angles(2));
    }

    #[test]
    fn test_curved_wall_is_flattened() {
        let mut world = World::new(Settings::default());
        let course = test_course(&mut world).unwrap();
        assert_eq!(course.walls.len(), 8);
        assert_eq!(course.breakable_walls.len(), 6);

        let corner = world.collider_of(course.walls[4]).unwrap();
        assert!(matches!(corner.shape(), Shape::CurvablePolygon { .. }));
        match corner.geometry() {
            Shape::Polygon { points } => assert_eq!(points.len(), 4 + 11 + 11),
            other => panic!("expected polygon, got {other:?}"),
        }

        let Some(Entity::BreakableWall(wall)) = world.entity(course.breakable_walls[4]) else {
            panic!("expected breakable wall");
        };
        assert_eq!(wall.hitpoints, 2);
        assert!((wall.angle - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_courses_run() {
        let mut world = World::new(Settings::default());
        let course = test_course(&mut world).unwrap();
        for _ in 0..600 {
            tick(&mut world, &TickInput::default(), FRAME_DT).unwrap();
        }
        let ball = world.ball(course.balls[0]).unwrap();
        assert!(ball.position.x().abs() < 600.0);
        assert!(ball.position.y().unwrap().abs() < 400.0);
    }
}
