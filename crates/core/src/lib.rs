pub mod annotation {
    pub mod domain {
        pub mod frame_annotator;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detection_params;
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod detect_image_use_case;
    pub mod frame_pipeline;
    pub mod pipeline_logger;
}

pub mod settings {
    pub mod settings_store;
}

pub mod shared {
    pub mod constants;
    pub mod face_rect;
    pub mod frame;
    pub mod model_resolver;
    pub mod video_metadata;
    pub mod video_source;
}

pub mod video {
    pub mod domain {
        pub mod image_reader;
        pub mod image_writer;
        pub mod video_reader;
    }
    pub mod infrastructure {
        pub mod camera_reader;
        pub mod ffmpeg_reader;
        pub mod image_file_reader;
        pub mod image_file_writer;
        pub mod reader_factory;
    }
}
