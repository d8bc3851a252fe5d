// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Self-contained HTML preview page.
//!
//! The page embeds the computed [`PageConfig`] as inert JSON and runs a
//! three.js module script that loads the asset, writes the weights into the
//! morph influences, stands the model on the floor, binds the garment and
//! drives the orbit camera.

use crate::types::PageConfig;
use serde::Serialize;

const CONFIG_SLOT: &str = "__MANNEQUIN_CONFIG__";
const IMPORT_MAP_SLOT: &str = "__IMPORT_MAP__";

const TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Mannequin preview</title>
<style>
  html, body { margin: 0; height: 100%; background: #f3f4f6; }
  #viewer { width: 100%; height: 100%; touch-action: none; cursor: grab; }
</style>
<script type="importmap">__IMPORT_MAP__</script>
</head>
<body>
<div id="viewer"></div>
<script id="mannequin-config" type="application/json">__MANNEQUIN_CONFIG__</script>
<script type="module">
import * as THREE from 'three';
import { GLTFLoader } from 'three/addons/loaders/GLTFLoader.js';

const cfg = JSON.parse(document.getElementById('mannequin-config').textContent);
const cam = cfg.camera;
const container = document.getElementById('viewer');

const scene = new THREE.Scene();
scene.background = new THREE.Color(0xf3f4f6);
scene.add(new THREE.HemisphereLight(0xffffff, 0x666666, 1.2));
const sun = new THREE.DirectionalLight(0xffffff, 1.0);
sun.position.set(2, 4, 3);
scene.add(sun);

const camera = new THREE.PerspectiveCamera(cam.fovDegrees, 1, 0.1, 100);
const renderer = new THREE.WebGLRenderer({ antialias: true });
renderer.setPixelRatio(window.devicePixelRatio);
container.appendChild(renderer.domElement);

const clamp = (v, lo, hi) => Math.min(hi, Math.max(lo, v));
const orbit = {
  distance: cam.defaultDistance,
  target: cam.defaultDistance,
  theta: cam.defaultTheta,
  phi: cam.defaultPhi,
  lookAtY: 0,
};

function syncCamera() {
  const s = Math.sin(orbit.phi);
  camera.position.set(
    orbit.distance * s * Math.sin(orbit.theta),
    orbit.lookAtY + orbit.distance * Math.cos(orbit.phi),
    orbit.distance * s * Math.cos(orbit.theta),
  );
  camera.lookAt(0, orbit.lookAtY, 0);
}

function setTarget(d) {
  if (!Number.isNaN(d)) orbit.target = clamp(d, cam.minDistance, cam.maxDistance);
}

function rotate(dx, dy) {
  orbit.theta -= dx * cam.rotateSpeed;
  orbit.phi = clamp(orbit.phi - dy * cam.rotateSpeed, cam.minPhi, cam.maxPhi);
  syncCamera();
}

let anchor = null;
let pinch = null;
const spread = (t) => Math.hypot(t[0].clientX - t[1].clientX, t[0].clientY - t[1].clientY);

const listeners = {
  pointerdown: (e) => { if (e.pointerType !== 'touch') anchor = { x: e.clientX, y: e.clientY }; },
  pointermove: (e) => {
    if (!anchor || e.pointerType === 'touch') return;
    rotate(e.clientX - anchor.x, e.clientY - anchor.y);
    anchor = { x: e.clientX, y: e.clientY };
  },
  pointerup: () => { anchor = null; },
  pointerleave: () => { anchor = null; },
  touchstart: (e) => {
    if (e.touches.length === 1) {
      pinch = null;
      anchor = { x: e.touches[0].clientX, y: e.touches[0].clientY };
    } else if (e.touches.length >= 2) {
      anchor = null;
      pinch = spread(e.touches);
    }
  },
  touchmove: (e) => {
    e.preventDefault();
    if (e.touches.length === 1 && anchor) {
      const t = e.touches[0];
      rotate(t.clientX - anchor.x, t.clientY - anchor.y);
      anchor = { x: t.clientX, y: t.clientY };
    } else if (e.touches.length >= 2) {
      const now = spread(e.touches);
      if (pinch !== null) setTarget(orbit.target - (now - pinch) * cam.pinchSensitivity);
      pinch = now;
    }
  },
  touchend: (e) => {
    pinch = null;
    anchor = e.touches.length === 1 ? { x: e.touches[0].clientX, y: e.touches[0].clientY } : null;
  },
  wheel: (e) => {
    e.preventDefault();
    setTarget(orbit.target + e.deltaY * cam.wheelSensitivity * orbit.distance);
  },
};
for (const [name, fn] of Object.entries(listeners)) {
  renderer.domElement.addEventListener(name, fn, { passive: false });
}

function resize() {
  const w = Math.max(1, container.clientWidth);
  const h = Math.max(1, container.clientHeight);
  camera.aspect = w / h;
  camera.updateProjectionMatrix();
  renderer.setSize(w, h);
}
const observer = new ResizeObserver(resize);
observer.observe(container);
resize();
syncCamera();

function classify(meshes) {
  const names = meshes.map((m) => (m.name || '').toLowerCase());
  const has = (name, words) => words.some((w) => name.includes(w));
  let body = names.findIndex((n) => has(n, cfg.roles.body));
  let garment = -1;
  names.forEach((n, i) => {
    if (i === body) return;
    if (garment < 0 && has(n, cfg.roles.garment)) garment = i;
    else if (body < 0 && has(n, cfg.roles.genericBody)) body = i;
  });
  const rest = meshes.map((_, i) => i).filter((i) => i !== body && i !== garment);
  if (body < 0 && rest.length) body = rest.shift();
  if (garment < 0 && rest.length) garment = rest.shift();
  return { body: meshes[body] ?? null, garment: meshes[garment] ?? null };
}

function applyWeights(mesh) {
  const dict = mesh.morphTargetDictionary;
  if (!dict || !mesh.morphTargetInfluences) return;
  for (const [key, weight] of Object.entries(cfg.weights)) {
    const alias = (cfg.aliases[key] || [key]).find((a) => a in dict);
    if (alias !== undefined) mesh.morphTargetInfluences[dict[alias]] = weight;
  }
}

function placeOnFloor(root, body) {
  root.position.set(0, 0, 0);
  root.updateMatrixWorld(true);
  const box = new THREE.Box3().setFromObject(body, true);
  if (box.isEmpty()) return;
  const center = box.getCenter(new THREE.Vector3());
  root.position.set(-center.x, -box.min.y, -center.z);
  orbit.lookAtY = (box.max.y - box.min.y) * cfg.eyeLineFraction;
  syncCamera();
}

function bindGarment(garment) {
  if (!garment) return;
  if (!cfg.garment) {
    garment.visible = false;
    return;
  }
  garment.visible = true;
  const materials = Array.isArray(garment.material) ? garment.material : [garment.material];
  for (const m of materials) {
    if (m && m.color) {
      m.color.setHex(cfg.garment.colorValue);
      m.needsUpdate = true;
    }
  }
  applyWeights(garment);
}

let root = null;
let disposed = false;
new GLTFLoader().load(
  cfg.modelUrl,
  (gltf) => {
    if (disposed) return;
    root = gltf.scene;
    scene.add(root);
    const meshes = [];
    root.traverse((o) => { if (o.isMesh) meshes.push(o); });
    const { body, garment } = classify(meshes);
    if (body) {
      applyWeights(body);
      placeOnFloor(root, body);
    }
    bindGarment(garment);
  },
  undefined,
  (err) => console.error('Failed to load mannequin asset', err),
);

let frame = 0;
function loop() {
  if (disposed) return;
  const gap = orbit.target - orbit.distance;
  if (Math.abs(gap) > cam.zoomEpsilon) {
    orbit.distance = clamp(orbit.distance + gap * cam.zoomSmoothing, cam.minDistance, cam.maxDistance);
    syncCamera();
  }
  renderer.render(scene, camera);
  frame = requestAnimationFrame(loop);
}
loop();

window.addEventListener('pagehide', () => {
  if (disposed) return;
  disposed = true;
  cancelAnimationFrame(frame);
  for (const [name, fn] of Object.entries(listeners)) {
    renderer.domElement.removeEventListener(name, fn);
  }
  observer.disconnect();
  if (root) {
    root.traverse((o) => {
      if (!o.isMesh) return;
      o.geometry.dispose();
      (Array.isArray(o.material) ? o.material : [o.material]).forEach((m) => m && m.dispose());
    });
  }
  renderer.dispose();
  renderer.domElement.remove();
});
</script>
</body>
</html>
"#;

#[derive(Serialize)]
struct ImportMap<'a> {
    imports: Imports<'a>,
}

#[derive(Serialize)]
struct Imports<'a> {
    three: &'a str,
    #[serde(rename = "three/addons/")]
    addons: String,
}

/// Serialize for embedding inside a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Addons directory matching a three.js module URL.
fn addons_url(three_module_url: &str) -> String {
    match three_module_url.strip_suffix("build/three.module.js") {
        Some(base) => format!("{}examples/jsm/", base),
        None => match three_module_url.rfind('/') {
            Some(i) => format!("{}/", &three_module_url[..i]),
            None => "./".to_string(),
        },
    }
}

/// Render the preview page.
pub fn render(config: &PageConfig, three_module_url: &str) -> serde_json::Result<String> {
    let import_map = ImportMap {
        imports: Imports {
            three: three_module_url,
            addons: addons_url(three_module_url),
        },
    };

    Ok(TEMPLATE
        .replacen(IMPORT_MAP_SLOT, &script_json(&import_map)?, 1)
        .replacen(CONFIG_SLOT, &script_json(config)?, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeightsResponse;
    use mannequin_core::{BodyParameters, MannequinConfig, Product};

    fn page(products: &[Product]) -> String {
        let config = MannequinConfig::default();
        let state = WeightsResponse::compute(&BodyParameters::default(), products, &config);
        let page = PageConfig::new("/models/mannequin.glb", state, &config);
        render(&page, "https://cdn.example/three@0.160.0/build/three.module.js").unwrap()
    }

    #[test]
    fn test_slots_filled() {
        let html = page(&[]);
        assert!(!html.contains(CONFIG_SLOT));
        assert!(!html.contains(IMPORT_MAP_SLOT));
        assert!(html.contains(r#""three/addons/":"https://cdn.example/three@0.160.0/examples/jsm/""#));
        assert!(html.contains(r#""modelUrl":"/models/mannequin.glb""#));
    }

    #[test]
    fn test_script_breakout_is_escaped() {
        let html = page(&[Product::new("</script><script>alert(1)</script>", "shirt")]);
        assert_eq!(html.matches("</script>").count(), 3);
        assert!(html.contains(r#"<\/script><script>alert(1)<\/script>"#));
    }

    #[test]
    fn test_addons_url() {
        assert_eq!(addons_url("/vendor/three.module.js"), "/vendor/");
        assert_eq!(addons_url("three.js"), "./");
    }
}
