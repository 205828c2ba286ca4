//! JNI bindings for the Android app.
//!
//! Each public function here corresponds to an `external fun` declaration
//! in RustBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! Structured values cross the boundary as JSON strings. Failures raise
//! `IllegalArgumentException` on the Java side and return null.

use jni::objects::{JByteArray, JClass, JString};
use jni::sys::{jdouble, jint, jstring};
use jni::JNIEnv;
use log::LevelFilter;

use crate::geo::{distance, LatLng};
use crate::gpx::import_route_bytes;
use crate::instruction::{format_distance_text, generate_instruction, Maneuver};
use crate::matcher::RouteStepMatcher;
use crate::route::{RouteGeometry, RouteStep};

/// Returns the library version.
/// Maps to: RustBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnpike_app_RustBridge_version(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    to_jstring(&mut env, Ok(crate::VERSION.to_string()))
}

/// Routes `log` output to logcat. Safe to call more than once.
/// Maps to: RustBridge.initLogging()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnpike_app_RustBridge_initLogging(
    _env: JNIEnv,
    _class: JClass,
) {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(LevelFilter::Info)
            .with_tag("turnpike"),
    );
}

/// Maps to: RustBridge.generateInstruction(maneuverJson: String) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnpike_app_RustBridge_generateInstruction(
    mut env: JNIEnv,
    _class: JClass,
    maneuver_json: JString,
) -> jstring {
    let result = read_string(&mut env, &maneuver_json).and_then(|json| {
        let maneuver: Maneuver =
            serde_json::from_str(&json).map_err(|e| format!("invalid maneuver: {e}"))?;
        Ok(generate_instruction(&maneuver))
    });
    to_jstring(&mut env, result)
}

/// Maps to: RustBridge.formatDistanceText(meters: Double) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnpike_app_RustBridge_formatDistanceText(
    mut env: JNIEnv,
    _class: JClass,
    meters: jdouble,
) -> jstring {
    to_jstring(&mut env, Ok(format_distance_text(meters)))
}

/// Maps to: RustBridge.distance(lat1, lng1, lat2, lng2) -> Double
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnpike_app_RustBridge_distance(
    _env: JNIEnv,
    _class: JClass,
    lat1: jdouble,
    lng1: jdouble,
    lat2: jdouble,
    lng2: jdouble,
) -> jdouble {
    distance(LatLng::new(lat1, lng1), LatLng::new(lat2, lng2))
}

/// Match a position against route steps.
/// Maps to: RustBridge.advance(stepsJson, fromIndex, lat, lng) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnpike_app_RustBridge_advance(
    mut env: JNIEnv,
    _class: JClass,
    steps_json: JString,
    from_index: jint,
    lat: jdouble,
    lng: jdouble,
) -> jstring {
    let result = read_string(&mut env, &steps_json).and_then(|json| {
        let steps: Vec<RouteStep> =
            serde_json::from_str(&json).map_err(|e| format!("invalid steps: {e}"))?;
        let geometry = RouteGeometry::new(steps).map_err(|e| e.to_string())?;
        let from = usize::try_from(from_index).unwrap_or(0);
        let progress = RouteStepMatcher::default().advance(&geometry, from, LatLng::new(lat, lng));
        serde_json::to_string(&progress).map_err(|e| format!("JSON serialize error: {e}"))
    });
    to_jstring(&mut env, result)
}

/// Import a GPX route and return its steps as JSON.
/// Maps to: RustBridge.importGpxRoute(data: ByteArray) -> String?
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_turnpike_app_RustBridge_importGpxRoute(
    mut env: JNIEnv,
    _class: JClass,
    data: JByteArray,
) -> jstring {
    let result = env
        .convert_byte_array(&data)
        .map_err(|e| format!("failed to read byte array: {e}"))
        .and_then(|bytes| import_route_bytes(&bytes).map_err(|e| e.to_string()))
        .and_then(|route| {
            serde_json::to_string(route.steps()).map_err(|e| format!("JSON serialize error: {e}"))
        });
    to_jstring(&mut env, result)
}

fn read_string(env: &mut JNIEnv, s: &JString) -> Result<String, String> {
    env.get_string(s)
        .map(String::from)
        .map_err(|e| format!("failed to read Java string: {e}"))
}

fn to_jstring(env: &mut JNIEnv, result: Result<String, String>) -> jstring {
    let outcome = result.and_then(|s| {
        env.new_string(s)
            .map_err(|e| format!("failed to create Java string: {e}"))
    });

    match outcome {
        Ok(s) => s.into_raw(),
        Err(msg) => {
            log::warn!("JNI call failed: {msg}");
            // If throwing fails too there is a pending exception already
            let _ = env.throw_new("java/lang/IllegalArgumentException", msg);
            std::ptr::null_mut()
        }
    }
}
