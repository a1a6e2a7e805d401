pub mod replay_face_analyzer;
